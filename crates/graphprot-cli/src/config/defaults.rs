pub struct DefaultsConfig {
    pub rounds: usize,
    pub method: &'static str,
    pub use_preloaded: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            rounds: 1,
            method: "mcl",
            use_preloaded: false,
        }
    }
}
