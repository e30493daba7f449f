/// Server push configuration for a single connection
#[derive(Debug, Clone)]
pub struct PushConf {
    /// Whether we advertised `SETTINGS_ENABLE_PUSH = 1`. If we didn't,
    /// a PUSH_PROMISE is a connection error.
    pub enable_push: bool,

    /// How many pushed streams may be open at the same time before we start
    /// refusing new ones. Streams that are being drained after a cancellation
    /// don't count.
    pub max_concurrent_pushes: Option<u32>,
}

impl Default for PushConf {
    fn default() -> Self {
        Self {
            enable_push: true,
            max_concurrent_pushes: Some(100),
        }
    }
}
