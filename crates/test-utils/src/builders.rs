use forkwatch::config::{ConfigFile, RawConfigFile};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the built-in defaults; durations are given in the same string
/// form as the TOML file.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    /// Zero delays and a short poll interval, handy for real-process tests.
    pub fn fast() -> Self {
        Self::new()
            .poll_interval("50ms")
            .startup_delay("0s")
            .settle_delay("0s")
    }

    pub fn workers(mut self, n: usize) -> Self {
        self.config.supervisor.workers = Some(n);
        self
    }

    pub fn poll_interval(mut self, d: &str) -> Self {
        self.config.supervisor.poll_interval = d.to_string();
        self
    }

    pub fn startup_delay(mut self, d: &str) -> Self {
        self.config.supervisor.startup_delay = d.to_string();
        self
    }

    pub fn settle_delay(mut self, d: &str) -> Self {
        self.config.supervisor.settle_delay = d.to_string();
        self
    }

    pub fn work(mut self, base: &str, step: &str) -> Self {
        self.config.worker.base_duration = base.to_string();
        self.config.worker.step = step.to_string();
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }

    /// Render as a TOML document that `load_and_validate` accepts.
    pub fn to_toml(&self) -> String {
        let sup = &self.config.supervisor;
        let mut out = String::from("[supervisor]\n");
        if let Some(n) = sup.workers {
            out.push_str(&format!("workers = {n}\n"));
        }
        out.push_str(&format!("poll_interval = \"{}\"\n", sup.poll_interval));
        out.push_str(&format!("startup_delay = \"{}\"\n", sup.startup_delay));
        out.push_str(&format!("settle_delay = \"{}\"\n", sup.settle_delay));
        out.push_str("\n[worker]\n");
        out.push_str(&format!(
            "base_duration = \"{}\"\n",
            self.config.worker.base_duration
        ));
        out.push_str(&format!("step = \"{}\"\n", self.config.worker.step));
        out
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
