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

//! Namespaces and classes

use super::{BASE_TYPE, CLASS_ATTRIBUTES, CLASS_BODY, MODULE_MEMBERS};
use crate::types::{DATA_STRUCTURE, ENTITY, MODULE};
use rhetos_compiler::codegen::{CodeBuilder, OutputTarget};
use rhetos_compiler::concepts::Concept;
use rhetos_compiler::plugin::ConceptCodeGenerator;

const USINGS: &str = "using System;
using System.ComponentModel.DataAnnotations;
using System.ComponentModel.DataAnnotations.Schema;
using Rhetos.Dom.DefaultConcepts;
";

fn name(concept: &Concept) -> Result<&str, String> {
    concept.text("Name").ok_or_else(|| format!("{} has no name", concept.key))
}

/// One `<Module>.cs` file per module
pub struct ModuleCodeGenerator;

impl ConceptCodeGenerator for ModuleCodeGenerator {
    fn name(&self) -> &str {
        "Module"
    }

    fn implements(&self) -> &str {
        MODULE
    }

    fn generate_code(&self, concept: &Concept, builder: &mut CodeBuilder<'_>) -> Result<(), String> {
        let module = name(concept)?;
        let code = format!("{}\nnamespace {}\n{{{}}}\n", USINGS, module, MODULE_MEMBERS.of(&concept.key).marker());
        builder.insert_code_to_file(code, &OutputTarget::new(module, format!("{}.cs", module)));
        builder.add_reference("System.ComponentModel.DataAnnotations");
        Ok(())
    }
}

/// A class for every data structure
pub struct DataStructureCodeGenerator;

impl ConceptCodeGenerator for DataStructureCodeGenerator {
    fn name(&self) -> &str {
        "DataStructure"
    }

    fn implements(&self) -> &str {
        DATA_STRUCTURE
    }

    fn generate_code(&self, concept: &Concept, builder: &mut CodeBuilder<'_>) -> Result<(), String> {
        let module = concept.reference("Module").ok_or_else(|| format!("{} has no module", concept.key))?;
        let code = format!(
            "\n    {}public class {}{}\n    {{{}\n    }}\n",
            CLASS_ATTRIBUTES.of(&concept.key).marker(),
            name(concept)?,
            BASE_TYPE.of(&concept.key).marker(),
            CLASS_BODY.of(&concept.key).marker()
        );
        builder.insert_code(code, &MODULE_MEMBERS.of(module));
        Ok(())
    }
}

/// Entities map to a table and implement `IEntity`
pub struct EntityCodeGenerator;

impl ConceptCodeGenerator for EntityCodeGenerator {
    fn name(&self) -> &str {
        "Entity"
    }

    fn implements(&self) -> &str {
        ENTITY
    }

    fn depends_on(&self) -> Vec<String> {
        vec!["DataStructure".to_string()]
    }

    fn generate_code(&self, concept: &Concept, builder: &mut CodeBuilder<'_>) -> Result<(), String> {
        let module = concept.reference("Module").ok_or_else(|| format!("{} has no module", concept.key))?;
        let schema = builder.graph().find_by_key(module).and_then(|m| m.text("Name")).ok_or_else(|| format!("{} is not declared", module))?;
        let table = format!("[Table(\"{}\", Schema = \"{}\")]\n    ", name(concept)?, schema);
        builder.insert_code(table, &CLASS_ATTRIBUTES.of(&concept.key));
        builder.replace_code(" : IEntity", &BASE_TYPE.of(&concept.key));
        builder.add_reference("Rhetos.Dom.DefaultConcepts.Interfaces");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::syntax;
    use rhetos_common::DslScript;
    use rhetos_compiler::{CompilerConfig, RhetosCompiler};
    use std::sync::Arc;

    #[test]
    fn test_computed_is_a_plain_class() {
        let compiler = RhetosCompiler::new(Arc::new(syntax().unwrap()), CompilerConfig::default());
        let model = compiler.build_model(vec![DslScript::from_text("Sales.rhe", "Module Sales { Computed Summary { Integer Total; } }")]).unwrap();
        let output = compiler.generate(&model).unwrap();
        let content = &output.sources.file("Sales.cs").unwrap().content;
        assert!(content.ends_with("namespace Sales\n{\n    public class Summary\n    {\n        public int? Total { get; set; }\n    }\n}\n"));
        assert_eq!(output.sources.references, vec!["System.ComponentModel.DataAnnotations".to_string()]);
    }

    #[test]
    fn test_module_without_classes() {
        let compiler = RhetosCompiler::new(Arc::new(syntax().unwrap()), CompilerConfig::default());
        let model = compiler.build_model(vec![DslScript::from_text("Empty.rhe", "Module Empty;")]).unwrap();
        let output = compiler.generate(&model).unwrap();
        assert!(output.sources.file("Empty.cs").unwrap().content.ends_with("namespace Empty\n{}\n"));
    }
}
