use serde_json::Value;

use crate::{Compute, ConfigError, EnvVarsInput, TaskConfig};

/// Registration options for a task, as written next to the function.
///
/// Nothing is validated until [`TaskOptions::normalize`] turns the options
/// into a [`TaskConfig`]:
/// - `compute` is upper-cased and defaults to `MEDIUM`;
/// - `ram`, `timeout`, `max_retries` and `env_vars` are only carried over when set;
/// - `env_vars` given as a mapping become pairs sorted by key.
#[derive(Debug, Clone, Default)]
pub struct TaskOptions {
    name: String,
    compute: Option<String>,
    ram: Option<String>,
    timeout: Option<String>,
    max_retries: Option<u32>,
    env_vars: Option<EnvVarsInput>,
}

impl TaskOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Compute tier: `"LOW"`, `"MEDIUM"` or `"HIGH"`, any case.
    pub fn compute(mut self, compute: impl Into<String>) -> Self {
        self.compute = Some(compute.into());
        self
    }

    /// RAM limit, e.g. `"512MB"` or `"2GB"`.
    pub fn ram(mut self, ram: impl Into<String>) -> Self {
        self.ram = Some(ram.into());
        self
    }

    /// Timeout, e.g. `"30s"` or `"5m"`.
    pub fn timeout(mut self, timeout: impl Into<String>) -> Self {
        self.timeout = Some(timeout.into());
        self
    }

    /// Timeout in milliseconds, sent to the host as `"<n>ms"`.
    pub fn timeout_ms(self, ms: u64) -> Self {
        self.timeout(format!("{ms}ms"))
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn env_vars(mut self, env_vars: impl Into<EnvVarsInput>) -> Self {
        self.env_vars = Some(env_vars.into());
        self
    }

    /// Read options from a JSON object using the registration keyword names.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let obj = value.as_object().ok_or(ConfigError::NotAnObject)?;

        let name = match obj.get("name") {
            Some(Value::String(s)) => s.clone(),
            None | Some(Value::Null) => String::new(),
            Some(_) => return Err(invalid("name", "a string")),
        };
        let mut opts = TaskOptions::new(name);

        match obj.get("compute") {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) => opts.compute = Some(s.clone()),
            Some(Value::Number(n)) => opts.compute = Some(n.to_string()),
            Some(_) => return Err(invalid("compute", "a string")),
        }
        match obj.get("ram") {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) => opts.ram = Some(s.clone()),
            Some(_) => return Err(invalid("ram", "a string such as \"512MB\"")),
        }
        match obj.get("timeout") {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) => opts.timeout = Some(s.clone()),
            Some(Value::Number(n)) => {
                let ms = n
                    .as_u64()
                    .ok_or_else(|| invalid("timeout", "a non-negative number of milliseconds"))?;
                opts = opts.timeout_ms(ms);
            }
            Some(_) => return Err(invalid("timeout", "a string such as \"30s\"")),
        }
        match obj.get("max_retries") {
            None | Some(Value::Null) => {}
            Some(v) => {
                let n = v
                    .as_u64()
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| invalid("max_retries", "a non-negative integer"))?;
                opts.max_retries = Some(n);
            }
        }
        match obj.get("env_vars") {
            None | Some(Value::Null) => {}
            Some(v) => opts.env_vars = Some(EnvVarsInput::try_from(v)?),
        }

        Ok(opts)
    }

    /// Produce the canonical configuration record.
    pub fn normalize(self) -> Result<TaskConfig, ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::EmptyName);
        }
        let compute = self
            .compute
            .as_deref()
            .map(Compute::from)
            .unwrap_or_default();

        Ok(TaskConfig::from_parts(
            self.name,
            compute,
            self.ram,
            self.timeout,
            self.max_retries,
            self.env_vars.map(EnvVarsInput::normalize),
        ))
    }
}

impl TryFrom<TaskOptions> for TaskConfig {
    type Error = ConfigError;

    fn try_from(opts: TaskOptions) -> Result<Self, Self::Error> {
        opts.normalize()
    }
}

fn invalid(field: &'static str, expected: &'static str) -> ConfigError {
    ConfigError::InvalidField { field, expected }
}
