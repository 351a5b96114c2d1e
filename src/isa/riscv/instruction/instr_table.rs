use crate::{define_riscv_isa, isa::riscv::instruction::InstrFormat};

// Entries with `use_mask: true` are matched on `mask`/`key` alone and never
// enter the funct tables; the others ignore `mask`/`key`.
#[rustfmt::skip]
define_riscv_isa!(
    RiscvInstr,
    RV32I, TABLE_RV32I, {
        LUI   { opcode: 0x37, funct3: 0, funct7: 0, format: InstrFormat::U, mask: 0, key: 0, use_mask: false, },
        AUIPC { opcode: 0x17, funct3: 0, funct7: 0, format: InstrFormat::U, mask: 0, key: 0, use_mask: false, },
        JAL   { opcode: 0x6f, funct3: 0, funct7: 0, format: InstrFormat::J, mask: 0, key: 0, use_mask: false, },
        JALR  { opcode: 0x67, funct3: 0, funct7: 0, format: InstrFormat::I, mask: 0, key: 0, use_mask: false, },

        BEQ  { opcode: 0x63, funct3: 0, funct7: 0, format: InstrFormat::B, mask: 0, key: 0, use_mask: false, },
        BNE  { opcode: 0x63, funct3: 1, funct7: 0, format: InstrFormat::B, mask: 0, key: 0, use_mask: false, },
        BLT  { opcode: 0x63, funct3: 4, funct7: 0, format: InstrFormat::B, mask: 0, key: 0, use_mask: false, },
        BGE  { opcode: 0x63, funct3: 5, funct7: 0, format: InstrFormat::B, mask: 0, key: 0, use_mask: false, },
        BLTU { opcode: 0x63, funct3: 6, funct7: 0, format: InstrFormat::B, mask: 0, key: 0, use_mask: false, },
        BGEU { opcode: 0x63, funct3: 7, funct7: 0, format: InstrFormat::B, mask: 0, key: 0, use_mask: false, },

        LB  { opcode: 0x03, funct3: 0, funct7: 0, format: InstrFormat::I, mask: 0, key: 0, use_mask: false, },
        LH  { opcode: 0x03, funct3: 1, funct7: 0, format: InstrFormat::I, mask: 0, key: 0, use_mask: false, },
        LW  { opcode: 0x03, funct3: 2, funct7: 0, format: InstrFormat::I, mask: 0, key: 0, use_mask: false, },
        LBU { opcode: 0x03, funct3: 4, funct7: 0, format: InstrFormat::I, mask: 0, key: 0, use_mask: false, },
        LHU { opcode: 0x03, funct3: 5, funct7: 0, format: InstrFormat::I, mask: 0, key: 0, use_mask: false, },

        SB { opcode: 0x23, funct3: 0, funct7: 0, format: InstrFormat::S, mask: 0, key: 0, use_mask: false, },
        SH { opcode: 0x23, funct3: 1, funct7: 0, format: InstrFormat::S, mask: 0, key: 0, use_mask: false, },
        SW { opcode: 0x23, funct3: 2, funct7: 0, format: InstrFormat::S, mask: 0, key: 0, use_mask: false, },

        ADDI  { opcode: 0x13, funct3: 0, funct7: 0, format: InstrFormat::I, mask: 0, key: 0, use_mask: false, },
        SLTI  { opcode: 0x13, funct3: 2, funct7: 0, format: InstrFormat::I, mask: 0, key: 0, use_mask: false, },
        SLTIU { opcode: 0x13, funct3: 3, funct7: 0, format: InstrFormat::I, mask: 0, key: 0, use_mask: false, },
        XORI  { opcode: 0x13, funct3: 4, funct7: 0, format: InstrFormat::I, mask: 0, key: 0, use_mask: false, },
        ORI   { opcode: 0x13, funct3: 6, funct7: 0, format: InstrFormat::I, mask: 0, key: 0, use_mask: false, },
        ANDI  { opcode: 0x13, funct3: 7, funct7: 0, format: InstrFormat::I, mask: 0, key: 0, use_mask: false, },

        // imm[11:5] must be exactly 0000000 / 0100000.
        SLLI { opcode: 0x13, funct3: 1, funct7: 0x00, format: InstrFormat::I, mask: 0xfe00707f, key: 0x00001013, use_mask: true, },
        SRLI { opcode: 0x13, funct3: 5, funct7: 0x00, format: InstrFormat::I, mask: 0xfe00707f, key: 0x00005013, use_mask: true, },
        SRAI { opcode: 0x13, funct3: 5, funct7: 0x20, format: InstrFormat::I, mask: 0xfe00707f, key: 0x40005013, use_mask: true, },

        ADD  { opcode: 0x33, funct3: 0, funct7: 0x00, format: InstrFormat::R, mask: 0, key: 0, use_mask: false, },
        SUB  { opcode: 0x33, funct3: 0, funct7: 0x20, format: InstrFormat::R, mask: 0, key: 0, use_mask: false, },
        SLL  { opcode: 0x33, funct3: 1, funct7: 0x00, format: InstrFormat::R, mask: 0, key: 0, use_mask: false, },
        SLT  { opcode: 0x33, funct3: 2, funct7: 0x00, format: InstrFormat::R, mask: 0, key: 0, use_mask: false, },
        SLTU { opcode: 0x33, funct3: 3, funct7: 0x00, format: InstrFormat::R, mask: 0, key: 0, use_mask: false, },
        XOR  { opcode: 0x33, funct3: 4, funct7: 0x00, format: InstrFormat::R, mask: 0, key: 0, use_mask: false, },
        SRL  { opcode: 0x33, funct3: 5, funct7: 0x00, format: InstrFormat::R, mask: 0, key: 0, use_mask: false, },
        SRA  { opcode: 0x33, funct3: 5, funct7: 0x20, format: InstrFormat::R, mask: 0, key: 0, use_mask: false, },
        OR   { opcode: 0x33, funct3: 6, funct7: 0x00, format: InstrFormat::R, mask: 0, key: 0, use_mask: false, },
        AND  { opcode: 0x33, funct3: 7, funct7: 0x00, format: InstrFormat::R, mask: 0, key: 0, use_mask: false, },

        FENCE   { opcode: 0x0f, funct3: 0, funct7: 0, format: InstrFormat::I, mask: 0, key: 0, use_mask: false, },
        FENCE_I { opcode: 0x0f, funct3: 1, funct7: 0, format: InstrFormat::I, mask: 0, key: 0, use_mask: false, },

        ECALL  { opcode: 0x73, funct3: 0, funct7: 0, format: InstrFormat::None, mask: 0xffffffff, key: 0x00000073, use_mask: true, },
        EBREAK { opcode: 0x73, funct3: 0, funct7: 0, format: InstrFormat::None, mask: 0xffffffff, key: 0x00100073, use_mask: true, },
    },

    RV32M, TABLE_RV32M, {
        MUL    { opcode: 0x33, funct3: 0, funct7: 0x01, format: InstrFormat::R, mask: 0, key: 0, use_mask: false, },
        MULH   { opcode: 0x33, funct3: 1, funct7: 0x01, format: InstrFormat::R, mask: 0, key: 0, use_mask: false, },
        MULHSU { opcode: 0x33, funct3: 2, funct7: 0x01, format: InstrFormat::R, mask: 0, key: 0, use_mask: false, },
        MULHU  { opcode: 0x33, funct3: 3, funct7: 0x01, format: InstrFormat::R, mask: 0, key: 0, use_mask: false, },
        DIV    { opcode: 0x33, funct3: 4, funct7: 0x01, format: InstrFormat::R, mask: 0, key: 0, use_mask: false, },
        DIVU   { opcode: 0x33, funct3: 5, funct7: 0x01, format: InstrFormat::R, mask: 0, key: 0, use_mask: false, },
        REM    { opcode: 0x33, funct3: 6, funct7: 0x01, format: InstrFormat::R, mask: 0, key: 0, use_mask: false, },
        REMU   { opcode: 0x33, funct3: 7, funct7: 0x01, format: InstrFormat::R, mask: 0, key: 0, use_mask: false, },
    },

    RVZICSR, TABLE_RVZICSR, {
        CSRRW  { opcode: 0x73, funct3: 1, funct7: 0, format: InstrFormat::Csr, mask: 0, key: 0, use_mask: false, },
        CSRRS  { opcode: 0x73, funct3: 2, funct7: 0, format: InstrFormat::Csr, mask: 0, key: 0, use_mask: false, },
        CSRRC  { opcode: 0x73, funct3: 3, funct7: 0, format: InstrFormat::Csr, mask: 0, key: 0, use_mask: false, },
        CSRRWI { opcode: 0x73, funct3: 5, funct7: 0, format: InstrFormat::Csr, mask: 0, key: 0, use_mask: false, },
        CSRRSI { opcode: 0x73, funct3: 6, funct7: 0, format: InstrFormat::Csr, mask: 0, key: 0, use_mask: false, },
        CSRRCI { opcode: 0x73, funct3: 7, funct7: 0, format: InstrFormat::Csr, mask: 0, key: 0, use_mask: false, },
    },

    RVSYSTEM, TABLE_RVSYSTEM, {
        MRET { opcode: 0x73, funct3: 0, funct7: 0x18, format: InstrFormat::None, mask: 0xffffffff, key: 0x30200073, use_mask: true, },
    },

    // custom-0: emulator exit and host call bridge, not part of any ratified extension.
    RVHOST, TABLE_RVHOST, {
        EXIT_IMM { opcode: 0x0b, funct3: 0, funct7: 0, format: InstrFormat::I, mask: 0, key: 0, use_mask: false, },
        IOCALL   { opcode: 0x0b, funct3: 1, funct7: 0, format: InstrFormat::I, mask: 0, key: 0, use_mask: false, },
        EXIT_REG { opcode: 0x0b, funct3: 4, funct7: 0, format: InstrFormat::I, mask: 0, key: 0, use_mask: false, },
    },
);
