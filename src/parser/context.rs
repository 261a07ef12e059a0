/// The six-value grammar context threaded through most productions.
///
/// It selects which sub-rule applies: whether a `,` terminates, whether a
/// scalar may span lines, and how separation is allowed to look.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Context {
    BlockOut,
    BlockIn,
    BlockKey,
    FlowOut,
    FlowIn,
    FlowKey,
}

impl Context {
    /// The context a nested flow collection parses its entries in.
    pub(crate) fn in_flow(self) -> Context {
        match self {
            Context::FlowOut | Context::FlowIn => Context::FlowIn,
            Context::BlockKey | Context::FlowKey => Context::FlowKey,
            other => other,
        }
    }

    /// Key contexts confine matching to a single line.
    pub(crate) fn is_key(self) -> bool {
        matches!(self, Context::BlockKey | Context::FlowKey)
    }
}
