pub mod runner;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::iter::FusedIterator;
use std::time::Duration;

/// Errors raised while building a CommandTemplate or Script from a definition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DefinitionError {
    #[error("command template must not be empty")]
    EmptyTemplate,
    #[error("parameter names must not be empty")]
    EmptyParameterName,
    #[error("parameter '{0}' is listed more than once")]
    DuplicateParameter(String),
    #[error("parameter '{0}' does not appear in the template")]
    UnusedParameter(String),
    #[error("script name must not be empty")]
    EmptyScriptName,
}

/// A required parameter was absent from the values supplied at resolution time.
/// `step` (1-based) and `script` are filled in when raised from a script resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingParameterError {
    pub missing: Vec<String>,
    pub step: Option<usize>,
    pub script: Option<String>,
}

impl MissingParameterError {
    pub fn new(missing: Vec<String>) -> Self {
        Self {
            missing,
            step: None,
            script: None,
        }
    }

    fn at_step(mut self, step: usize, script: &str) -> Self {
        self.step = Some(step);
        self.script = Some(script.to_string());
        self
    }
}

impl fmt::Display for MissingParameterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing parameter(s): {}", self.missing.join(", "))?;
        if let Some(step) = self.step {
            write!(f, " at step {}", step)?;
        }
        if let Some(ref script) = self.script {
            write!(f, " of script '{}'", script)?;
        }
        Ok(())
    }
}

impl std::error::Error for MissingParameterError {}

/// Replace every literal occurrence of `name` in `text` with `value`.
///
/// Plain textual replacement: a name that is a substring of another name, or of
/// literal template text, is matched there too. All substitution goes through
/// here so a delimited placeholder syntax can be swapped in later.
pub fn substitute(text: &str, name: &str, value: &str) -> String {
    text.replace(name, value)
}

/// CommandTemplate is a single command with named placeholders and a post-issue wait
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CommandTemplateDef")]
pub struct CommandTemplate {
    template: String,
    wait_after_ms: u64,
    param_names: Vec<String>,
}

#[derive(Deserialize)]
struct CommandTemplateDef {
    template: String,
    #[serde(default, alias = "waitAfterMs")]
    wait_after_ms: u64,
    #[serde(default, alias = "paramNames")]
    param_names: Vec<String>,
}

impl TryFrom<CommandTemplateDef> for CommandTemplate {
    type Error = DefinitionError;

    fn try_from(def: CommandTemplateDef) -> Result<Self, Self::Error> {
        Self::new(def.template, def.wait_after_ms, def.param_names)
    }
}

impl CommandTemplate {
    pub fn new(
        template: impl Into<String>,
        wait_after_ms: u64,
        param_names: Vec<String>,
    ) -> Result<Self, DefinitionError> {
        let template = template.into();
        if template.is_empty() {
            return Err(DefinitionError::EmptyTemplate);
        }

        for (i, name) in param_names.iter().enumerate() {
            if name.is_empty() {
                return Err(DefinitionError::EmptyParameterName);
            }
            if param_names[..i].contains(name) {
                return Err(DefinitionError::DuplicateParameter(name.clone()));
            }
            if !template.contains(name.as_str()) {
                return Err(DefinitionError::UnusedParameter(name.clone()));
            }
        }

        Ok(Self {
            template,
            wait_after_ms,
            param_names,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    pub fn wait_after(&self) -> Duration {
        Duration::from_millis(self.wait_after_ms)
    }

    /// Substitute `values` into a fresh copy of the template.
    ///
    /// Every listed parameter must be present in `values`; otherwise nothing is
    /// substituted and the error names all absent parameters. Returns the
    /// command and its effective wait: `wait_override` when set and non-zero,
    /// else the template's own wait.
    pub fn resolve<V: fmt::Display>(
        &self,
        values: &HashMap<String, V>,
        wait_override: Option<Duration>,
    ) -> Result<(String, Duration), MissingParameterError> {
        let missing: Vec<String> = self
            .param_names
            .iter()
            .filter(|name| !values.contains_key(name.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(MissingParameterError::new(missing));
        }

        let mut command = self.template.clone();
        for name in &self.param_names {
            if let Some(value) = values.get(name.as_str()) {
                command = substitute(&command, name, &value.to_string());
            }
        }

        let wait = match wait_override {
            Some(wait) if !wait.is_zero() => wait,
            _ => self.wait_after(),
        };

        Ok((command, wait))
    }
}

/// Script is a named, ordered sequence of command templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScriptDef")]
pub struct Script {
    name: String,
    steps: Vec<CommandTemplate>,
}

#[derive(Deserialize)]
struct ScriptDef {
    name: String,
    #[serde(default)]
    steps: Vec<CommandTemplate>,
}

impl TryFrom<ScriptDef> for Script {
    type Error = DefinitionError;

    fn try_from(def: ScriptDef) -> Result<Self, Self::Error> {
        Self::new(def.name, def.steps)
    }
}

impl Script {
    pub fn new(name: impl Into<String>, steps: Vec<CommandTemplate>) -> Result<Self, DefinitionError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DefinitionError::EmptyScriptName);
        }
        Ok(Self { name, steps })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[CommandTemplate] {
        &self.steps
    }

    /// Lazily resolve every step against `values`, in order.
    pub fn resolve_all<'a, V: fmt::Display>(&'a self, values: &'a HashMap<String, V>) -> Resolution<'a, V> {
        Resolution {
            script: self,
            values,
            wait_override: None,
            next: 0,
            pending_wait: Duration::ZERO,
            done: false,
        }
    }
}

/// One resolved step, ready to be handed to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStep {
    /// 1-based position in the script
    pub step: usize,
    pub command: String,
    /// Time the consumer must let pass before sending this command
    pub wait_before: Duration,
    /// Effective wait of this step, observed before the next one
    pub wait_after: Duration,
}

/// Pull-based resolution of a script.
///
/// Each `next()` resolves exactly one step. A missing parameter is reported
/// at the step that needs it, after which the sequence is exhausted. Dropping
/// the iterator early is the cancellation path.
pub struct Resolution<'a, V> {
    script: &'a Script,
    values: &'a HashMap<String, V>,
    wait_override: Option<Duration>,
    next: usize,
    pending_wait: Duration,
    done: bool,
}

impl<'a, V> Resolution<'a, V> {
    /// Apply a wait override to every step of this resolution
    pub fn with_wait_override(mut self, wait_override: Option<Duration>) -> Self {
        self.wait_override = wait_override;
        self
    }
}

impl<'a, V: fmt::Display> Iterator for Resolution<'a, V> {
    type Item = Result<ResolvedStep, MissingParameterError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let Some(template) = self.script.steps.get(self.next) else {
            self.done = true;
            return None;
        };
        self.next += 1;
        let step = self.next;

        match template.resolve(self.values, self.wait_override) {
            Ok((command, wait_after)) => {
                let wait_before = std::mem::replace(&mut self.pending_wait, wait_after);
                Some(Ok(ResolvedStep {
                    step,
                    command,
                    wait_before,
                    wait_after,
                }))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e.at_step(step, &self.script.name)))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            (0, Some(0))
        } else {
            (0, Some(self.script.steps.len() - self.next))
        }
    }
}

impl<'a, V: fmt::Display> FusedIterator for Resolution<'a, V> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn step(template: &str, wait_ms: u64, params: &[&str]) -> CommandTemplate {
        CommandTemplate::new(template, wait_ms, params.iter().map(|p| p.to_string()).collect())
            .unwrap()
    }

    #[test]
    fn test_resolve_single_parameter() {
        let t = step("ping HOST", 0, &["HOST"]);
        let vals = values(&[("HOST", "10.0.0.1")]);

        let (first, wait) = t.resolve(&vals, None).unwrap();
        assert_eq!(first, "ping 10.0.0.1");
        assert_eq!(wait, Duration::ZERO);

        let (second, _) = t.resolve(&vals, None).unwrap();
        assert_eq!(second, first);
        assert_eq!(t.template(), "ping HOST");
    }

    #[test]
    fn test_resolve_with_different_values_leaves_no_residue() {
        let t = step("interface IFACE", 0, &["IFACE"]);
        let (a, _) = t.resolve(&values(&[("IFACE", "eth0")]), None).unwrap();
        let (b, _) = t.resolve(&values(&[("IFACE", "eth1")]), None).unwrap();
        assert_eq!(a, "interface eth0");
        assert_eq!(b, "interface eth1");
    }

    #[test]
    fn test_resolve_replaces_every_occurrence() {
        let t = step("echo NAME NAME", 0, &["NAME"]);
        let (cmd, _) = t.resolve(&values(&[("NAME", "x")]), None).unwrap();
        assert_eq!(cmd, "echo x x");
    }

    #[test]
    fn test_resolve_accepts_non_string_values() {
        let t = step("vlan VLAN_ID", 0, &["VLAN_ID"]);
        let vals: HashMap<String, u32> = HashMap::from([("VLAN_ID".to_string(), 42)]);
        let (cmd, _) = t.resolve(&vals, None).unwrap();
        assert_eq!(cmd, "vlan 42");
    }

    #[test]
    fn test_resolve_missing_parameters_are_named() {
        let t = step("set A to B", 0, &["A", "B"]);
        let err = t.resolve(&values(&[("B", "1")]), None).unwrap_err();
        assert_eq!(err.missing, vec!["A".to_string()]);
        assert_eq!(err.step, None);

        let err = t.resolve(&values(&[]), None).unwrap_err();
        assert_eq!(err.missing, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(err.to_string(), "missing parameter(s): A, B");
    }

    #[test]
    fn test_resolve_wait_override() {
        let t = step("show version", 250, &[]);
        let vals = values(&[]);

        assert_eq!(t.resolve(&vals, None).unwrap().1, Duration::from_millis(250));
        assert_eq!(
            t.resolve(&vals, Some(Duration::from_millis(10))).unwrap().1,
            Duration::from_millis(10)
        );
        // a zero override falls back to the template's own wait
        assert_eq!(
            t.resolve(&vals, Some(Duration::ZERO)).unwrap().1,
            Duration::from_millis(250)
        );
    }

    #[test]
    fn test_overlapping_names_follow_listed_order() {
        // "ID" is replaced first, which consumes the "ID" inside "IDX";
        // "IDX" then no longer occurs and "9" is never used.
        let t = step("set IDX to ID", 0, &["ID", "IDX"]);
        let (cmd, _) = t.resolve(&values(&[("ID", "5"), ("IDX", "9")]), None).unwrap();
        assert_eq!(cmd, "set 5X to 5");
    }

    #[test]
    fn test_name_inside_literal_text_is_overmatched() {
        let t = step("PORT_DESC PORT", 0, &["PORT"]);
        let (cmd, _) = t.resolve(&values(&[("PORT", "22")]), None).unwrap();
        assert_eq!(cmd, "22_DESC 22");
    }

    #[test]
    fn test_template_definition_validation() {
        assert_eq!(
            CommandTemplate::new("", 0, vec![]).unwrap_err(),
            DefinitionError::EmptyTemplate
        );
        assert_eq!(
            CommandTemplate::new("a B", 0, vec!["B".into(), "B".into()]).unwrap_err(),
            DefinitionError::DuplicateParameter("B".into())
        );
        assert_eq!(
            CommandTemplate::new("a B", 0, vec!["C".into()]).unwrap_err(),
            DefinitionError::UnusedParameter("C".into())
        );
        assert_eq!(
            CommandTemplate::new("a B", 0, vec!["".into()]).unwrap_err(),
            DefinitionError::EmptyParameterName
        );
        assert_eq!(Script::new("  ", vec![]).unwrap_err(), DefinitionError::EmptyScriptName);
    }

    #[test]
    fn test_script_definition_from_json() {
        let json = r#"{
            "name": "backup",
            "steps": [
                {"template": "copy run tftp://SERVER/FILE", "wait_after_ms": 500, "param_names": ["SERVER", "FILE"]},
                {"template": "exit", "waitAfterMs": 0}
            ]
        }"#;
        let script: Script = serde_json::from_str(json).unwrap();
        assert_eq!(script.name(), "backup");
        assert_eq!(script.steps().len(), 2);
        assert_eq!(script.steps()[0].wait_after(), Duration::from_millis(500));
        assert!(script.steps()[1].param_names().is_empty());

        let round: Script = serde_json::from_value(serde_json::to_value(&script).unwrap()).unwrap();
        assert_eq!(round, script);
    }

    #[test]
    fn test_script_definition_rejects_invalid_steps() {
        let json = r#"{"name": "bad", "steps": [{"template": "show X", "param_names": ["Y"]}]}"#;
        let err = serde_json::from_str::<Script>(json).unwrap_err();
        assert!(err.to_string().contains("'Y' does not appear"));

        let negative = r#"{"name": "bad", "steps": [{"template": "x", "wait_after_ms": -1}]}"#;
        assert!(serde_json::from_str::<Script>(negative).is_err());
    }

    #[test]
    fn test_resolve_all_yields_steps_in_order() {
        let script = Script::new(
            "three",
            vec![step("one A", 100, &["A"]), step("two", 0, &[]), step("three A", 5, &["A"])],
        )
        .unwrap();
        let vals = values(&[("A", "x")]);

        let steps: Vec<ResolvedStep> = script.resolve_all(&vals).collect::<Result<_, _>>().unwrap();
        let commands: Vec<&str> = steps.iter().map(|s| s.command.as_str()).collect();
        assert_eq!(commands, vec!["one x", "two", "three x"]);
        assert_eq!(steps.iter().map(|s| s.step).collect::<Vec<_>>(), vec![1, 2, 3]);

        // each step carries the previous step's wait as its pre-send delay
        assert_eq!(steps[0].wait_before, Duration::ZERO);
        assert_eq!(steps[1].wait_before, Duration::from_millis(100));
        assert_eq!(steps[2].wait_before, Duration::ZERO);
        assert_eq!(steps[2].wait_after, Duration::from_millis(5));
    }

    #[test]
    fn test_resolve_all_is_lazy_on_missing_parameter() {
        let script = Script::new(
            "partial",
            vec![step("first", 0, &[]), step("second B", 0, &["B"]), step("third", 0, &[])],
        )
        .unwrap();
        let vals = values(&[]);
        let mut resolution = script.resolve_all(&vals);

        assert_eq!(resolution.next().unwrap().unwrap().command, "first");

        let err = resolution.next().unwrap().unwrap_err();
        assert_eq!(err.missing, vec!["B".to_string()]);
        assert_eq!(err.step, Some(2));
        assert_eq!(err.script.as_deref(), Some("partial"));
        assert_eq!(err.to_string(), "missing parameter(s): B at step 2 of script 'partial'");

        assert!(resolution.next().is_none());
        assert!(resolution.next().is_none());
    }

    #[test]
    fn test_resolve_all_invocations_are_independent() {
        let script = Script::new("s", vec![step("host H", 0, &["H"])]).unwrap();
        let a = values(&[("H", "a")]);
        let b = values(&[("H", "b")]);

        let mut first = script.resolve_all(&a);
        let mut second = script.resolve_all(&b);
        assert_eq!(second.next().unwrap().unwrap().command, "host b");
        assert_eq!(first.next().unwrap().unwrap().command, "host a");
        assert!(first.next().is_none());
    }

    #[test]
    fn test_resolve_all_wait_override_applies_to_every_step() {
        let script = Script::new("s", vec![step("a", 1000, &[]), step("b", 1000, &[])]).unwrap();
        let vals = values(&[]);
        let steps: Vec<ResolvedStep> = script
            .resolve_all(&vals)
            .with_wait_override(Some(Duration::from_millis(1)))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(steps[1].wait_before, Duration::from_millis(1));
        assert_eq!(steps[1].wait_after, Duration::from_millis(1));
    }

    #[test]
    fn test_empty_script_yields_nothing() {
        let script = Script::new("empty", vec![]).unwrap();
        let vals = values(&[]);
        assert_eq!(script.resolve_all(&vals).count(), 0);
    }
}
