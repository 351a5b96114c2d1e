pub struct ISABuilder<Desc: Clone> {
    instructions: Vec<Desc>,
}

impl<Desc: Clone> ISABuilder<Desc> {
    pub fn new() -> Self {
        ISABuilder {
            instructions: Vec::new(),
        }
    }

    pub fn add(mut self, desc: &[Desc]) -> Self {
        self.instructions.extend_from_slice(desc);
        self
    }

    pub fn build(self) -> Vec<Desc> {
        self.instructions
    }
}

#[macro_export]
macro_rules! define_instr_enum {
    ($isa_name:ident, $($name:ident),* $(,)?) => {
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $isa_name {
            $($name),*
        }

        impl $isa_name {
            pub fn name(&self) -> &'static str {
                match self {
                    $($isa_name::$name => stringify!($name)),*
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeMask {
    pub key: u32,
    pub mask: u32,
}

impl DecodeMask {
    pub const fn matches(&self, instr: u32) -> bool {
        (instr & self.mask) == self.key
    }
}
