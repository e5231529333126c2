use thiserror::Error;

/// Problems found while validating a node tree before the first tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeConfigError {
    #[error("composite `{node}` has no children")]
    EmptyComposite { node: &'static str },
    #[error("random selector `{node}` has only zero-weight children")]
    AllWeightsZero { node: &'static str },
    #[error("node `{node}` has an inverted {sampler} range ({min} > {max})")]
    InvalidRange {
        node: &'static str,
        sampler: &'static str,
        min: u32,
        max: u32,
    },
    #[error("delayed node `{node}` can time out after {runtime} ticks, before its {delay}-tick delay fires")]
    DelayOutlastsRuntime {
        node: &'static str,
        delay: u64,
        runtime: u32,
    },
}
