use specgen_core::compiler::AnalyzedDeclaration;
use specgen_core::model::{Declaration, DeclarationKind, OwningScope};
use specgen_core::{Diagnostics, Severity};

pub fn severity_icon(severity: Severity) -> &'static str {
    match severity {
        Severity::Note => "ℹ️ ",
        Severity::Warning => "⚠️ ",
        Severity::Error => "❌",
    }
}

pub fn print_diagnostics(diagnostics: &Diagnostics) {
    if diagnostics.entries().is_empty() {
        return;
    }
    println!("\n🩺 Diagnostics:");
    for diagnostic in diagnostics.entries() {
        println!("   {} {}", severity_icon(diagnostic.severity), diagnostic);
    }
}

pub fn print_declaration(position: usize, analyzed: &AnalyzedDeclaration) {
    let declaration = &analyzed.declaration;
    println!("{}. {}", position, declaration.id());

    match declaration {
        Declaration::Command(decl) => {
            let kind = match &decl.kind {
                DeclarationKind::ClassRooted => "class-rooted".to_string(),
                DeclarationKind::MethodRooted { method, params, .. } => {
                    format!("method-rooted ({}({}))", method, params.join(", "))
                }
            };
            match &decl.command {
                Some(meta) => println!("   🚀 Command: {} [{}]", meta.name, kind),
                None => println!("   🧩 Holder [{}]", kind),
            }
            if let Some(parent) = &decl.super_command {
                println!("   🧬 Super command: {}", parent);
            }
            if !decl.subcommands.is_empty() {
                let names: Vec<&str> = decl.subcommands.iter().map(|(n, _)| n.as_str()).collect();
                println!("   🌿 Subcommands: {}", names.join(", "));
            }
            if !decl.mixins.is_empty() {
                let names: Vec<&str> = decl.mixins.iter().map(|(n, _)| n.as_str()).collect();
                println!("   🔗 Mixins: {}", names.join(", "));
            }
            println!(
                "   ⚙️  Args: {} option(s), {} positional(s), {} group(s)",
                decl.direct_options().count(),
                decl.direct_positionals().count(),
                decl.arg_groups.len()
            );
        }
        Declaration::SyntheticContainer(_) => println!("   📦 Synthetic container"),
    }

    match declaration.owner() {
        OwningScope::Root { package: Some(package) } => println!("   📁 Package: {}", package),
        OwningScope::Root { package: None } => println!("   📁 Package: (root)"),
        OwningScope::Declaration { id } => println!("   📁 Nested in: {}", id),
    }
    println!("   📏 Depth: {}", analyzed.depth);
}
