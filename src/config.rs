pub mod ram_config {
    use crate::config::arch_config::WordType;

    /// First RAM address. Everything below is memory-mapped I/O.
    pub const BASE_ADDR: WordType = 0x8000_0000;
    pub const DEFAULT_PC_VALUE: WordType = BASE_ADDR;

    /// Must stay a power of two, RAM offsets are masked with `SIZE - 1`.
    pub const DEFAULT_SIZE: usize = 32 * 1024;
}

pub mod arch_config {
    use crate::gen_name_list;

    pub type WordType = u32;
    pub type SignedWordType = i32;

    pub const REGFILE_CNT: usize = 32;

    pub const REG_NAME_PLAIN: [&str; REGFILE_CNT] = gen_name_list!("x"; 0, 31);

    #[rustfmt::skip]
    pub const REG_NAME_ABI: [&str; REGFILE_CNT] = [
        "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2",
        "s0",   "s1", "a0", "a1", "a2", "a3", "a4", "a5",
        "a6",   "a7", "s2", "s3", "s4", "s5", "s6", "s7",
        "s8",   "s9", "s10", "s11", "t3", "t4", "t5", "t6",
    ];

    /// Style used when printing general register names.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum RegisterNaming {
        /// `x0` .. `x31`
        #[default]
        Numeric,
        /// `zero`, `ra`, `sp`, ...
        Abi,
    }

    impl RegisterNaming {
        pub fn table(self) -> &'static [&'static str; REGFILE_CNT] {
            match self {
                RegisterNaming::Numeric => &REG_NAME_PLAIN,
                RegisterNaming::Abi => &REG_NAME_ABI,
            }
        }

        pub fn name(self, idx: u8) -> &'static str {
            self.table().get(idx as usize).copied().unwrap_or("??")
        }
    }
}
