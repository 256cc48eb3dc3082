macro_rules! emit {
    ($generator:expr, $mnemonic:ident, $operand:expr) => {
        $generator.push(crate::ir::Instruction::new(
            crate::ir::Mnemonic::$mnemonic,
            $operand,
        ))
    };
}
