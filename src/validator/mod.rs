//! Stateless invariant checking for candidate graphs.

use crate::error::{Issue, IssueKind};
use crate::model::{Graph, decode_graph};
use serde::{Deserialize, Serialize};
use serde_json::Value;

mod policy;
mod rules;

pub use policy::{DEFAULT_EXECUTOR_COMPONENT, DEFAULT_JOIN_COMPONENT, SchemaPolicy, is_blank};
pub use rules::{AcyclicRule, ExecutorRule, FieldSchemaRule, GraphRule, JoinRule, ReferenceRule};

/// The `{ok, errors, warnings}` outcome of a validation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub ok: bool,
    pub errors: Vec<Issue>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn error(&mut self, issue: Issue) {
        self.errors.push(issue);
    }

    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn has_kind(&self, kind: IssueKind) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }

    fn finish(mut self) -> Self {
        self.ok = self.errors.is_empty();
        self
    }
}

/// Runs every registered rule against a graph under one [`SchemaPolicy`].
pub struct Validator {
    policy: SchemaPolicy,
    rules: Vec<Box<dyn GraphRule>>,
}

pub struct ValidatorBuilder {
    policy: SchemaPolicy,
    rules: Vec<Box<dyn GraphRule>>,
}

impl ValidatorBuilder {
    pub fn new() -> Self {
        Self {
            policy: SchemaPolicy::default(),
            rules: rules::default_rules(),
        }
    }

    pub fn with_policy(mut self, policy: SchemaPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Adds a rule; a rule with the same name as an existing one replaces it.
    pub fn with_rule(mut self, rule: Box<dyn GraphRule>) -> Self {
        self.rules.retain(|r| r.name() != rule.name());
        self.rules.push(rule);
        self
    }

    pub fn without_rule(mut self, name: &str) -> Self {
        self.rules.retain(|r| r.name() != name);
        self
    }

    pub fn build(self) -> Validator {
        Validator {
            policy: self.policy,
            rules: self.rules,
        }
    }
}

impl Default for ValidatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for Validator {
    fn default() -> Self {
        ValidatorBuilder::new().build()
    }
}

impl Validator {
    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::new()
    }

    pub fn with_policy(policy: SchemaPolicy) -> Self {
        ValidatorBuilder::new().with_policy(policy).build()
    }

    pub fn policy(&self) -> &SchemaPolicy {
        &self.policy
    }

    /// Checks a typed graph. All rules run, nothing short-circuits.
    pub fn validate(&self, graph: &Graph) -> ValidationReport {
        let mut report = ValidationReport::default();
        for rule in &self.rules {
            rule.check(graph, &self.policy, &mut report);
        }
        let report = report.finish();
        log::debug!(
            "validated graph ({} nodes, {} edges): {} error(s), {} warning(s)",
            graph.node_count(),
            graph.edge_count(),
            report.errors.len(),
            report.warnings.len()
        );
        report
    }

    /// Checks a raw graph document: structural problems found while decoding are
    /// reported alongside the rule findings for whatever part of the graph decoded.
    pub fn validate_value(&self, value: &Value) -> ValidationReport {
        let decoded = decode_graph(value);
        let mut report = match &decoded.graph {
            Some(graph) => self.validate(graph),
            None => ValidationReport::default(),
        };
        let mut errors = decoded.issues;
        errors.append(&mut report.errors);
        report.errors = errors;
        report.warnings.extend(decoded.warnings);
        report.finish()
    }

    pub fn validate_json(&self, json: &str) -> ValidationReport {
        match serde_json::from_str::<Value>(json) {
            Ok(value) => self.validate_value(&value),
            Err(e) => ValidationReport {
                ok: false,
                errors: vec![Issue::structural("", format!("invalid JSON: {}", e))],
                warnings: Vec::new(),
            },
        }
    }
}
