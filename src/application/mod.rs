// Application layer: wires loading, graph building, tracing and output.

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::Config;
use crate::domain::callgraph::{BuiltinFilter, CallGraph};
use crate::domain::entry_point::EntryPoint;
use crate::domain::error::TraceError;
use crate::domain::model::{ContractKind, FunctionId, SourceModel, Visibility};
use crate::domain::trace::{Trace, TraceStats, TraceWalker};
use crate::ports::{OutputExporter, SourceModelLoader, TraceRenderer};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractSummary {
    pub name: String,
    pub kind: ContractKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionSummary {
    pub id: FunctionId,
    pub signature: String,
    pub visibility: Visibility,
    /// Declared on a base contract rather than the listed one
    pub inherited: bool,
}

/// A loaded model with its call graph, shared by any number of traces.
pub struct TraceSession {
    model: SourceModel,
    graph: CallGraph,
}

impl TraceSession {
    pub fn new(model: SourceModel, builtins: &BuiltinFilter) -> Self {
        let graph = CallGraph::build(&model, builtins);
        Self { model, graph }
    }

    pub fn model(&self) -> &SourceModel {
        &self.model
    }

    pub fn graph(&self) -> &CallGraph {
        &self.graph
    }

    pub fn trace(&self, entry: &EntryPoint, max_depth: usize) -> Result<Trace, TraceError> {
        let function = entry.resolve(&self.model)?;
        info!(entry = %entry, resolved = %function.id(), "resolved entry point");
        Ok(TraceWalker::new(&self.graph)
            .with_max_depth(max_depth)
            .walk(&function.id()))
    }

    /// Independent traces over the same graph, in parallel. Results keep
    /// the order of `entries`.
    pub fn trace_many(&self, entries: &[EntryPoint], max_depth: usize) -> Vec<Result<Trace, TraceError>> {
        entries
            .par_iter()
            .map(|entry| self.trace(entry, max_depth))
            .collect()
    }

    pub fn list_contracts(&self) -> Vec<ContractSummary> {
        self.model
            .contracts()
            .iter()
            .map(|c| ContractSummary {
                name: c.name.clone(),
                kind: c.kind,
            })
            .collect()
    }

    /// Functions callable on `contract`: its own first, then inherited ones
    /// in linearization order. Overridden declarations are left out.
    pub fn list_functions(&self, contract: &str) -> Result<Vec<FunctionSummary>, TraceError> {
        if self.model.contract(contract).is_none() {
            return Err(TraceError::ContractNotFound {
                contract: contract.to_string(),
            });
        }

        let mut seen = HashSet::new();
        let mut listed = Vec::new();
        for base in self.model.linearization(contract).iter() {
            let Some(base) = self.model.contract(base) else {
                continue;
            };
            for function in &base.functions {
                if !seen.insert((function.name.clone(), function.param_types())) {
                    continue;
                }
                listed.push(FunctionSummary {
                    id: function.id(),
                    signature: function.signature(),
                    visibility: function.visibility,
                    inherited: base.name != contract,
                });
            }
        }
        Ok(listed)
    }
}

pub struct AnalyzeUsecase<'a> {
    pub loader: &'a dyn SourceModelLoader,
    pub renderer: &'a dyn TraceRenderer,
    pub exporter: &'a dyn OutputExporter,
    pub config: &'a Config,
}

impl<'a> AnalyzeUsecase<'a> {
    pub fn load(&self, paths: &[PathBuf]) -> Result<TraceSession> {
        let model = self
            .loader
            .load(paths)
            .context("Failed to load source facts")?;
        let builtins = BuiltinFilter::new(&self.config.graph.builtins);
        Ok(TraceSession::new(model, &builtins))
    }

    /// Load, trace `entry`, render and export. Returns the trace summary.
    pub fn run(&self, paths: &[PathBuf], entry: &EntryPoint, destination: Option<&Path>) -> Result<TraceStats> {
        let session = self.load(paths)?;
        let trace = session.trace(entry, self.config.trace.max_depth)?;
        let rendered = self
            .renderer
            .render(session.model(), &trace)
            .context("Failed to render trace")?;
        self.exporter
            .export(&rendered, destination)
            .context("Failed to write trace output")?;
        Ok(trace.stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::{ModelError, RenderError};
    use crate::domain::model::{Call, Contract, Function, Param};
    use std::sync::Mutex;

    fn session() -> TraceSession {
        let mut hook = Function::new("_hook", vec![]);
        hook.visibility = Visibility::Internal;
        let mut run = Function::new("run", vec![Param::new("uint256", "n")]);
        run.calls = vec![Call::new("_hook")];

        let model = SourceModel::new(vec![
            Contract::new("Base", &[], vec![hook.clone(), Function::new("ping", vec![])]),
            Contract::new("Child", &["Base"], vec![run, hook]),
        ])
        .unwrap();
        TraceSession::new(model, &BuiltinFilter::default())
    }

    #[test]
    fn test_list_functions_hides_overridden() {
        let listed = session().list_functions("Child").unwrap();
        let ids: Vec<String> = listed.iter().map(|f| f.id.to_string()).collect();
        assert_eq!(ids, vec!["Child.run(uint256)", "Child._hook()", "Base.ping()"]);
        assert!(listed[2].inherited);
        assert!(!listed[1].inherited);
    }

    #[test]
    fn test_list_contracts_in_model_order() {
        let names: Vec<String> = session().list_contracts().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Base", "Child"]);
    }

    #[test]
    fn test_list_functions_unknown_contract() {
        assert!(matches!(
            session().list_functions("Nope"),
            Err(TraceError::ContractNotFound { .. })
        ));
    }

    #[test]
    fn test_trace_many_keeps_input_order() {
        let session = session();
        let results = session.trace_many(
            &[
                EntryPoint::new("Child", "run"),
                EntryPoint::new("Child", "missing"),
                EntryPoint::new("Base", "ping"),
            ],
            8,
        );
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().nodes.len(), 2);
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().entry.to_string(), "Base.ping()");
    }

    struct FixedLoader;

    impl SourceModelLoader for FixedLoader {
        fn load(&self, _paths: &[PathBuf]) -> Result<SourceModel, ModelError> {
            SourceModel::new(vec![Contract::new("Base", &[], vec![Function::new("ping", vec![])])])
        }
    }

    struct BrokenRenderer;

    impl TraceRenderer for BrokenRenderer {
        fn render(&self, _model: &SourceModel, _trace: &Trace) -> Result<String, RenderError> {
            Err(serde_json::from_str::<u8>("not json").unwrap_err().into())
        }
    }

    #[derive(Default)]
    struct RecordingExporter {
        written: Mutex<Vec<String>>,
    }

    impl OutputExporter for RecordingExporter {
        fn export(&self, content: &str, _destination: Option<&Path>) -> std::io::Result<()> {
            self.written.lock().unwrap().push(content.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_render_failure_is_reported_and_nothing_written() {
        let config = Config::default();
        let exporter = RecordingExporter::default();
        let usecase = AnalyzeUsecase {
            loader: &FixedLoader,
            renderer: &BrokenRenderer,
            exporter: &exporter,
            config: &config,
        };

        let err = usecase
            .run(&[], &EntryPoint::new("Base", "ping"), None)
            .unwrap_err();
        assert!(err.to_string().contains("Failed to render trace"));
        assert!(err.chain().any(|cause| cause.downcast_ref::<RenderError>().is_some()));
        assert!(exporter.written.lock().unwrap().is_empty());
    }
}
