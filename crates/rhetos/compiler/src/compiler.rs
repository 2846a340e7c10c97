// Dotlanth
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Build orchestration: scripts in, generated sources out
//!
//! Stages run strictly in sequence and the first failing stage aborts the
//! build. Generated files are written to a staging folder beside the output
//! folder and compiled there; they move into the output folder only after
//! generation and compilation have succeeded, and the stale sweep runs last.

use crate::codegen::{CodeGenerator, GeneratedSourceSet, GenerationOutput, SourceWriter, StagingDir};
use crate::concepts::ConceptGraph;
use crate::config::CompilerConfig;
use crate::error::{RhetosError, RhetosResult};
use crate::macros::{ExpansionReport, MacroExpander};
use crate::parser::DslParser;
use crate::parser::tokenizer::Tokenizer;
use crate::plugin::DslSyntax;
use crate::validation::validate_graph;
use rhetos_common::{DslScript, load_scripts};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// External compiler for the generated sources
///
/// `output_dir` is the staging folder holding exactly the files of `sources`.
pub trait SourceCompiler: Send + Sync {
    fn compile(&self, sources: &GeneratedSourceSet, output_dir: &Path) -> Result<(), String>;
}

/// Expanded and validated concept graph of one script set
#[derive(Debug)]
pub struct DslModel {
    pub graph: ConceptGraph,
    pub scripts: usize,
    pub tokens: usize,
    pub parsed_concepts: usize,
    pub expansion: ExpansionReport,
}

/// Summary of a successful build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub scripts: usize,
    pub tokens: usize,
    pub parsed_concepts: usize,
    pub total_concepts: usize,
    pub macro_iterations: usize,
    pub files_written: usize,
    pub files_unchanged: usize,
    pub files_removed: usize,
    pub references: Vec<String>,
}

pub struct RhetosCompiler {
    syntax: Arc<DslSyntax>,
    config: CompilerConfig,
    source_compiler: Option<Arc<dyn SourceCompiler>>,
}

impl RhetosCompiler {
    pub fn new(syntax: Arc<DslSyntax>, config: CompilerConfig) -> Self {
        Self {
            syntax,
            config,
            source_compiler: None,
        }
    }

    pub fn with_source_compiler(mut self, compiler: impl SourceCompiler + 'static) -> Self {
        self.source_compiler = Some(Arc::new(compiler));
        self
    }

    pub fn syntax(&self) -> &DslSyntax {
        &self.syntax
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Tokenize, parse, expand and validate
    pub fn build_model(&self, scripts: Vec<DslScript>) -> RhetosResult<DslModel> {
        self.config.validate()?;
        if scripts.is_empty() {
            warn!("Building from an empty script set");
        }
        let script_count = scripts.len();
        let mut tokenizer = Tokenizer::new(scripts);
        let tokens = tokenizer.tokenize_all()?.len();
        info!("Tokenized {} scripts into {} tokens", script_count, tokens);

        let mut graph = self.syntax.new_graph();
        let parser = DslParser::new(self.syntax.registry(), self.config.parser.clone());
        let parsed_concepts = parser.parse_into(&mut tokenizer, &mut graph)?;
        info!("Parsed {} concept statements into {} concepts", parsed_concepts, graph.len());

        let expansion = MacroExpander::new(&self.syntax)
            .with_max_iterations(self.config.max_macro_iterations)
            .with_parallel(self.config.parallel_macro_evaluation)
            .expand(&mut graph)?;

        validate_graph(&self.syntax, &graph)?;
        info!("Validated {} concepts", graph.len());

        Ok(DslModel {
            graph,
            scripts: script_count,
            tokens,
            parsed_concepts,
            expansion,
        })
    }

    /// Generate sources in memory without touching the output folder
    pub fn generate(&self, model: &DslModel) -> RhetosResult<GenerationOutput> {
        let output = CodeGenerator::new(&self.syntax).with_file_header(self.config.file_header.clone()).generate(&model.graph)?;
        Ok(output)
    }

    /// Full build from scripts already in memory
    pub fn build(&self, scripts: Vec<DslScript>) -> RhetosResult<BuildReport> {
        let started = Instant::now();
        let model = self.build_model(scripts)?;
        let output = self.generate(&model)?;

        let staging = StagingDir::next_to(&self.config.output_dir)?;
        SourceWriter::new(staging.path()).with_skip_unchanged(false).write_all(&output.sources)?;
        if let Some(compiler) = &self.source_compiler {
            compiler.compile(&output.sources, staging.path()).map_err(RhetosError::Compile)?;
        }

        let writer = SourceWriter::new(&self.config.output_dir).with_skip_unchanged(self.config.skip_unchanged_files);
        let written = writer.promote(&output.sources, staging.path())?;
        drop(staging);

        let files_removed = if self.config.sweep_stale_files { writer.sweep()? } else { 0 };

        let report = BuildReport {
            scripts: model.scripts,
            tokens: model.tokens,
            parsed_concepts: model.parsed_concepts,
            total_concepts: model.graph.len(),
            macro_iterations: model.expansion.iterations,
            files_written: written.written,
            files_unchanged: written.unchanged,
            files_removed,
            references: output.sources.references,
        };
        info!(
            "Build finished in {:?}: {} concepts, {} files written, {} unchanged, {} removed",
            started.elapsed(),
            report.total_concepts,
            report.files_written,
            report.files_unchanged,
            report.files_removed
        );
        Ok(report)
    }

    /// Full build from every script under `scripts_dir`
    pub fn build_from_dir(&self, scripts_dir: &Path) -> RhetosResult<BuildReport> {
        let scripts = load_scripts(scripts_dir)?;
        info!("Loaded {} scripts from {}", scripts.len(), scripts_dir.display());
        self.build(scripts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::{OutputTarget, TagTemplate};
    use crate::concepts::ConceptInfo;
    use crate::test_support::{FnGenerator, FnMacro, SamplePlugin};
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const CLASSES: TagTemplate = TagTemplate::appendable("Classes");

    fn syntax() -> Arc<DslSyntax> {
        let plugin = SamplePlugin::default()
            .with_macro(FnMacro::new("EntityId", "EntityInfo", |concept, _| {
                Ok(vec![ConceptInfo::new("IntegerInfo").with_reference("DataStructure", concept.key.clone()).with_text("Name", "ID")])
            }))
            .with_generator(FnGenerator::new("Module", "ModuleInfo", |concept, builder| {
                let name = concept.text("Name").unwrap_or_default();
                builder.insert_code_to_file(format!("namespace {} {{{}}}", name, CLASSES.of(&concept.key).marker()), &OutputTarget::new(name, format!("{}.cs", name)));
                builder.add_reference("System.Runtime");
                Ok(())
            }))
            .with_generator(FnGenerator::new("Class", "EntityInfo", |concept, builder| {
                let module = concept.reference("Module").ok_or("no module")?;
                builder.insert_code(format!(" class {} {{}}", concept.text("Name").unwrap_or_default()), &CLASSES.of(module));
                Ok(())
            }));
        Arc::new(plugin.syntax())
    }

    fn script(text: &str) -> Vec<DslScript> {
        vec![DslScript::from_text("Demo.rhe", text)]
    }

    #[test]
    fn test_build_writes_sources() {
        let dir = TempDir::new().unwrap();
        let compiler = RhetosCompiler::new(syntax(), CompilerConfig::new(dir.path()));
        let report = compiler.build(script("Module Demo { Entity Person { ShortString Name; } }")).unwrap();

        assert_eq!(report.scripts, 1);
        assert_eq!(report.parsed_concepts, 3);
        assert_eq!(report.total_concepts, 4);
        assert_eq!(report.macro_iterations, 2);
        assert_eq!(report.files_written, 1);
        assert_eq!(report.references, vec!["System.Runtime".to_string()]);
        assert_eq!(fs::read_to_string(dir.path().join("Demo.cs")).unwrap(), "namespace Demo { class Person {}}");
    }

    #[test]
    fn test_rebuild_is_stable_and_sweeps() {
        let dir = TempDir::new().unwrap();
        let compiler = RhetosCompiler::new(syntax(), CompilerConfig::new(dir.path()));
        compiler.build(script("Module Demo { Entity Person; } Module Old;")).unwrap();
        assert!(dir.path().join("Old.cs").exists());

        let report = compiler.build(script("Module Demo { Entity Person; }")).unwrap();
        assert_eq!(report.files_written, 0);
        assert_eq!(report.files_unchanged, 1);
        assert_eq!(report.files_removed, 1);
        assert!(!dir.path().join("Old.cs").exists());
    }

    #[test]
    fn test_failed_build_leaves_output_untouched() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Keep.cs"), "previous").unwrap();
        let compiler = RhetosCompiler::new(syntax(), CompilerConfig::new(dir.path()));

        let error = compiler.build(script("Module Demo { Entity Person { Reference Boss Demo.Nobody; } }")).unwrap_err();
        assert!(matches!(error, RhetosError::Validation(_)));
        assert_eq!(fs::read_to_string(dir.path().join("Keep.cs")).unwrap(), "previous");

        let error = compiler.build(script("Module Demo { Entiti Person; }")).unwrap_err();
        assert_eq!(error.code(), "RH106");
        assert!(dir.path().join("Keep.cs").exists());
    }

    struct RecordingCompiler(Mutex<Vec<String>>);

    impl SourceCompiler for Arc<RecordingCompiler> {
        fn compile(&self, sources: &GeneratedSourceSet, output_dir: &Path) -> Result<(), String> {
            self.0.lock().unwrap().extend(sources.files.iter().map(|f| f.path.clone()));
            if let Some(missing) = sources.files.iter().find(|f| !output_dir.join(&f.path).is_file()) {
                return Err(format!("{} was not written", missing.path));
            }
            if sources.file("Broken.cs").is_some() { Err("CS1002: ; expected".to_string()) } else { Ok(()) }
        }
    }

    #[test]
    fn test_source_compiler_receives_sources() {
        let dir = TempDir::new().unwrap();
        let recording = Arc::new(RecordingCompiler(Mutex::new(Vec::new())));
        let compiler = RhetosCompiler::new(syntax(), CompilerConfig::new(dir.path()).with_sweep(false)).with_source_compiler(Arc::clone(&recording));
        compiler.build(script("Module Demo; Module Sales;")).unwrap();
        assert_eq!(*recording.0.lock().unwrap(), vec!["Demo.cs".to_string(), "Sales.cs".to_string()]);

        let error = compiler.build(script("Module Broken;")).unwrap_err();
        assert_eq!(error.to_string(), "Compilation of generated sources failed: CS1002: ; expected");
        assert!(!dir.path().join("Broken.cs").exists());
        assert!(dir.path().join("Demo.cs").exists());
        let staging = format!(".{}.staging-{}", dir.path().file_name().unwrap().to_string_lossy(), std::process::id());
        assert!(!dir.path().with_file_name(staging).exists());
    }

    #[test]
    fn test_build_from_dir() {
        let scripts = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        fs::write(scripts.path().join("a.rhe"), "Module A;").unwrap();
        fs::write(scripts.path().join("b.rhe"), "Module B;").unwrap();
        let compiler = RhetosCompiler::new(syntax(), CompilerConfig::new(output.path()));
        let report = compiler.build_from_dir(scripts.path()).unwrap();
        assert_eq!(report.scripts, 2);
        assert_eq!(report.files_written, 2);
    }
}
