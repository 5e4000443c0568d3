//! Port-count rules per component type.

/// Allowed number of ports on one side of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortCount {
    Exactly(usize),
    AtLeast(usize),
}

impl PortCount {
    pub fn admits(self, n: usize) -> bool {
        match self {
            PortCount::Exactly(k) => n == k,
            PortCount::AtLeast(k) => n >= k,
        }
    }
}

impl std::fmt::Display for PortCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortCount::Exactly(k) => write!(f, "exactly {}", k),
            PortCount::AtLeast(k) => write!(f, "at least {}", k),
        }
    }
}

/// Inlet/outlet port counts a component type requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub inlets: PortCount,
    pub outlets: PortCount,
}

impl Arity {
    /// Propellant source (tank): no inlet, one outlet.
    pub const SOURCE: Arity = Arity::new(PortCount::Exactly(0), PortCount::Exactly(1));
    /// Terminal sink (nozzle exit): one inlet, no outlet.
    pub const SINK: Arity = Arity::new(PortCount::Exactly(1), PortCount::Exactly(0));
    /// Single inlet, single outlet.
    pub const TWO_PORT: Arity = Arity::new(PortCount::Exactly(1), PortCount::Exactly(1));

    pub const fn new(inlets: PortCount, outlets: PortCount) -> Self {
        Self { inlets, outlets }
    }

    pub fn is_source(&self) -> bool {
        self.inlets == PortCount::Exactly(0)
    }

    pub fn is_sink(&self) -> bool {
        self.outlets == PortCount::Exactly(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_count_admits() {
        assert!(PortCount::Exactly(2).admits(2));
        assert!(!PortCount::Exactly(2).admits(3));
        assert!(PortCount::AtLeast(2).admits(5));
        assert!(!PortCount::AtLeast(2).admits(1));
    }

    #[test]
    fn source_and_sink() {
        assert!(Arity::SOURCE.is_source());
        assert!(!Arity::SOURCE.is_sink());
        assert!(Arity::SINK.is_sink());
        assert!(!Arity::TWO_PORT.is_source());
    }
}
