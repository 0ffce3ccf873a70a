//! Renders the procedure IR to Rust tokens against the runtime crate

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use super::ir::{
    Accessor, ArgBuild, ArgSeed, BuilderCall, FnRef, GeneratedModule, GroupBuild, GroupCall,
    InstanceArg, Procedure, ProcedureKind, SpecArg, Stmt, SubcommandOwner, WrapSource,
};
use super::naming::{ident, snake_case};
use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use crate::model::{ScopeType, Visibility};

pub struct Renderer {
    runtime: syn::Path,
    root: syn::Path,
}

impl Renderer {
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        Ok(Self {
            runtime: parse_path(&config.runtime_crate)?,
            root: parse_path(&config.module_root)?,
        })
    }

    /// Contents of a top-level artifact: the module body without its `mod` wrapper
    pub fn render_file(&self, module: &GeneratedModule) -> Result<TokenStream> {
        self.module_body(module)
    }

    fn module_body(&self, module: &GeneratedModule) -> Result<TokenStream> {
        let runtime = &self.runtime;
        let procedures = module
            .procedures
            .iter()
            .map(|procedure| self.procedure(procedure))
            .collect::<Result<Vec<_>>>()?;
        let children = module
            .children
            .iter()
            .map(|child| self.nested_module(child))
            .collect::<Result<Vec<_>>>()?;

        Ok(quote! {
            #![allow(unused_imports, unused_variables, unused_mut, dead_code, clippy::all)]
            use #runtime::{
                ArgGroupSpec, Bound, CommandSpec, MethodRef, OptionSpec, PositionalParamSpec,
                ScopeType, SpecHandle, Upcast, Value,
            };

            #(#procedures)*
            #(#children)*
        })
    }

    fn nested_module(&self, module: &GeneratedModule) -> Result<TokenStream> {
        let vis = visibility(module.visibility);
        let name = ident(&module.name);
        let body = self.module_body(module)?;
        Ok(quote! {
            #vis mod #name {
                #body
            }
        })
    }

    fn procedure(&self, procedure: &Procedure) -> Result<TokenStream> {
        let name = ident(&procedure.name);
        let ty = parse_type(&procedure.instance_type)?;
        let in_create = matches!(procedure.kind, ProcedureKind::CreateSpec { .. });
        let body = procedure
            .body
            .iter()
            .map(|stmt| self.stmt(stmt, &ty, in_create))
            .collect::<Result<Vec<_>>>()?;

        Ok(match procedure.kind {
            ProcedureKind::CreateSpec {
                method_rooted: false,
            } => quote! {
                pub fn #name() -> CommandSpec {
                    #(#body)*
                }
            },
            ProcedureKind::CreateSpec {
                method_rooted: true,
            } => quote! {
                pub fn #name(obj: &Bound<#ty>) -> CommandSpec {
                    #(#body)*
                }
            },
            ProcedureKind::ConfigureOptions => quote! {
                pub fn #name(cons: &mut dyn FnMut(OptionSpec), obj: &Bound<#ty>) {
                    #(#body)*
                }
            },
            ProcedureKind::ConfigureParameters => quote! {
                pub fn #name(cons: &mut dyn FnMut(PositionalParamSpec), obj: &Bound<#ty>) {
                    #(#body)*
                }
            },
            _ => quote! {
                pub fn #name(cs: &mut CommandSpec, obj: &Bound<#ty>) {
                    #(#body)*
                }
            },
        })
    }

    fn stmt(&self, stmt: &Stmt, ty: &syn::Type, in_create: bool) -> Result<TokenStream> {
        Ok(match stmt {
            Stmt::NewInstance => quote! {
                let obj = &Bound::new(<#ty>::default());
            },
            Stmt::ResolveMethod { name, params } => quote! {
                let method = MethodRef::declared(obj, #name, &[#(#params),*])
                    .unwrap_or_else(|err| panic!("{}", err));
            },
            Stmt::WrapSpec(WrapSource::Instance) => quote! {
                let mut cs = CommandSpec::wrap_without_inspection(obj);
            },
            Stmt::WrapSpec(WrapSource::Method) => quote! {
                let mut cs = CommandSpec::wrap_method_without_inspection(obj, method);
            },
            Stmt::SetName(name) => quote! {
                cs.set_name(#name);
            },
            Stmt::SetDescription(lines) => quote! {
                cs.set_description(&[#(#lines),*]);
            },
            Stmt::AddSubcommand {
                name,
                factory,
                owner,
            } => {
                let factory = self.fn_path(factory);
                let owner = match owner {
                    SubcommandOwner::None => quote! {},
                    SubcommandOwner::This => quote! { obj },
                    SubcommandOwner::New(owner_ty) => {
                        let owner_ty = parse_type(owner_ty)?;
                        quote! { &Bound::new(<#owner_ty>::default()) }
                    }
                };
                quote! {
                    cs.add_subcommand(#name, #factory(#owner));
                }
            }
            Stmt::Configure {
                target,
                spec,
                instance,
            } => {
                let target = self.fn_path(target);
                let spec = match spec {
                    SpecArg::Spec if in_create => quote! { &mut cs },
                    SpecArg::Spec => quote! { cs },
                    SpecArg::OptionSink => quote! { &mut |option| cs.add_option(option) },
                    SpecArg::PositionalSink => {
                        quote! { &mut |positional| cs.add_positional(positional) }
                    }
                };
                let instance = match instance {
                    InstanceArg::This => quote! { obj },
                    InstanceArg::Upcast(base) => {
                        let base = parse_type(base)?;
                        quote! { Upcast::<#base>::upcast(obj) }
                    }
                };
                quote! {
                    #target(#spec, #instance);
                }
            }
            Stmt::AddMixin {
                name,
                mixin_type,
                configure,
            } => {
                let mixin_ty = parse_type(mixin_type)?;
                let field = ident(name);
                let value = format_ident!("mixin_{}", snake_case(name));
                let spec = format_ident!("mixin_spec_{}", snake_case(name));
                let configure = configure.as_ref().map(|target| {
                    let target = self.fn_path(target);
                    quote! { #target(&mut #spec, &#value); }
                });
                quote! {
                    let #value = Bound::new(<#mixin_ty>::default());
                    obj.borrow_mut().#field = #value.clone();
                    let mut #spec = CommandSpec::wrap_without_inspection(&#value);
                    #configure
                    cs.add_mixin(#name, #spec);
                }
            }
            Stmt::AddArg(build) => self.arg(build),
            Stmt::AddArgGroup(group) => self.group(group)?,
            Stmt::BindSpec { field } => {
                let field = ident(field);
                quote! {
                    obj.borrow_mut().#field = cs.handle();
                }
            }
            Stmt::BindParent { field } => {
                let field = ident(field);
                quote! {
                    cs.add_parent_command_injection({
                        let obj = obj.clone();
                        move |parent: SpecHandle| obj.borrow_mut().#field = parent
                    });
                }
            }
            Stmt::ReturnSpec => quote! { cs },
        })
    }

    fn arg(&self, build: &ArgBuild) -> TokenStream {
        let var = ident(&build.var);
        let seed = match &build.seed {
            ArgSeed::Names(names) => quote! { OptionSpec::builder(&[#(#names),*]) },
            ArgSeed::Index(index) => quote! { PositionalParamSpec::builder().index(#index) },
        };
        let calls = build.calls.iter().map(builder_call);
        quote! {
            let #var = #seed
                #(#calls)*
                .build();
            cons(#var);
        }
    }

    fn group(&self, group: &GroupBuild) -> Result<TokenStream> {
        let var = ident(&group.var);
        let value = ident(&group.instance);
        let field = ident(&group.field);
        let group_ty = parse_type(&group.group_type)?;
        let options = self.fn_path(&group.options);
        let parameters = self.fn_path(&group.parameters);
        let calls = group.calls.iter().map(|call| match call {
            GroupCall::Exclusive(exclusive) => quote! { .exclusive(#exclusive) },
            GroupCall::Multiplicity(multiplicity) => quote! { .multiplicity(#multiplicity) },
            GroupCall::Heading(heading) => quote! { .heading(#heading) },
        });

        Ok(quote! {
            let #value = Bound::new(<#group_ty>::default());
            obj.borrow_mut().#field = #value.clone();
            let mut #var = ArgGroupSpec::builder()
                #(#calls)*;
            #options(&mut |arg| #var.add_arg(arg), &#value);
            #parameters(&mut |arg| #var.add_arg(arg), &#value);
            cs.add_arg_group(#var.build());
        })
    }

    fn fn_path(&self, target: &FnRef) -> TokenStream {
        let root = &self.root;
        let segments = target.module.segments().iter().map(|s| ident(s));
        let name = ident(&target.name);
        quote! { #root #(:: #segments)* :: #name }
    }
}

fn builder_call(call: &BuilderCall) -> TokenStream {
    match call {
        BuilderCall::FallbackValue(value) => quote! { .fallback_value(#value) },
        BuilderCall::Negatable(negatable) => quote! { .negatable(#negatable) },
        BuilderCall::UsageHelp(usage_help) => quote! { .usage_help(#usage_help) },
        BuilderCall::Arity(arity) => quote! { .arity(#arity) },
        BuilderCall::Description(lines) => quote! { .description(&[#(#lines),*]) },
        BuilderCall::HasInitialValue(value) => quote! { .has_initial_value(#value) },
        BuilderCall::Hidden(hidden) => quote! { .hidden(#hidden) },
        BuilderCall::Scope(ScopeType::Local) => quote! { .scope_type(ScopeType::Local) },
        BuilderCall::Scope(ScopeType::Inherit) => quote! { .scope_type(ScopeType::Inherit) },
        BuilderCall::Type(ty) => quote! { .type_name(#ty) },
        BuilderCall::AuxiliaryTypes(types) => quote! { .auxiliary_types(&[#(#types),*]) },
        BuilderCall::DefaultValue(value) => quote! { .default_value(#value) },
        BuilderCall::MapFallbackValue(value) => quote! { .map_fallback_value(#value) },
        BuilderCall::Preprocessor(ty) => quote! { .preprocessor_type(#ty) },
        BuilderCall::ParameterConsumer(ty) => quote! { .parameter_consumer_type(#ty) },
        BuilderCall::Getter(accessor) => {
            let read = read(accessor);
            quote! {
                .getter({
                    let obj = obj.clone();
                    move || Value::from(#read)
                })
            }
        }
        BuilderCall::Setter { target, previous } => {
            let previous = match previous {
                Some(accessor) => {
                    let read = read(accessor);
                    quote! { Value::from(#read) }
                }
                None => quote! { Value::Null },
            };
            let write = match target {
                Accessor::Field { name } => {
                    let name = ident(name);
                    quote! { obj.borrow_mut().#name = value.convert(); }
                }
                Accessor::Method { name } => {
                    let name = ident(name);
                    quote! { obj.borrow_mut().#name(value.convert()); }
                }
            };
            quote! {
                .setter({
                    let obj = obj.clone();
                    move |value: Value| {
                        let previous = #previous;
                        #write
                        previous
                    }
                })
            }
        }
    }
}

fn read(accessor: &Accessor) -> TokenStream {
    match accessor {
        Accessor::Field { name } => {
            let name = ident(name);
            quote! { obj.borrow().#name.clone() }
        }
        Accessor::Method { name } => {
            let name = ident(name);
            quote! { obj.borrow().#name() }
        }
    }
}

fn visibility(visibility: Visibility) -> TokenStream {
    match visibility {
        Visibility::Public => quote! { pub },
        Visibility::Crate => quote! { pub(crate) },
    }
}

fn parse_path(path: &str) -> Result<syn::Path> {
    syn::parse_str(path).map_err(|_| Error::InvalidTypePath(path.to_string()))
}

fn parse_type(path: &str) -> Result<syn::Type> {
    syn::parse_str(path).map_err(|_| Error::InvalidTypePath(path.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::ir::ModulePath;

    fn module(name: &str, procedures: Vec<Procedure>) -> GeneratedModule {
        GeneratedModule {
            declaration: name.into(),
            name: format!("{}_cli_cfg", snake_case(name)),
            path: ModulePath(vec![format!("{}_cli_cfg", snake_case(name))]),
            visibility: Visibility::Public,
            instance_type: format!("crate::{name}"),
            abstract_container: false,
            procedures,
            children: Vec::new(),
        }
    }

    #[test]
    fn test_rendered_module_parses() {
        let renderer = Renderer::new(&GeneratorConfig::default()).expect("renderer");
        let mut app = module(
            "App",
            vec![Procedure {
                element: "App".into(),
                name: "configure_options".to_string(),
                kind: ProcedureKind::ConfigureOptions,
                instance_type: "crate::App".to_string(),
                body: vec![Stmt::AddArg(ArgBuild {
                    var: "opt0".to_string(),
                    seed: ArgSeed::Names(vec!["-t".to_string()]),
                    calls: vec![
                        BuilderCall::Arity("1".to_string()),
                        BuilderCall::Getter(Accessor::Field {
                            name: "type".to_string(),
                        }),
                        BuilderCall::Setter {
                            target: Accessor::Field {
                                name: "type".to_string(),
                            },
                            previous: None,
                        },
                    ],
                })],
            }],
        );
        app.children.push(module("Inner", Vec::new()));

        let tokens = renderer.render_file(&app).expect("render");
        let file: syn::File = syn::parse2(tokens).expect("valid Rust");
        let nested = file.items.iter().any(|item| {
            matches!(item, syn::Item::Mod(m) if m.ident == "inner_cli_cfg")
        });
        assert!(nested);
        assert!(file.items.len() >= 3);
    }

    #[test]
    fn test_invalid_runtime_path_is_rejected() {
        let config = GeneratorConfig {
            runtime_crate: "not a path".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            Renderer::new(&config),
            Err(Error::InvalidTypePath(_))
        ));
    }

    #[test]
    fn test_function_paths_are_absolute() {
        let renderer = Renderer::new(&GeneratorConfig::default()).expect("renderer");
        let path = renderer.fn_path(&FnRef {
            module: ModulePath(vec!["app_cli_cfg".to_string(), "sub_cli_cfg".to_string()]),
            name: "configure_all".to_string(),
        });
        assert_eq!(
            path.to_string().replace(' ', ""),
            "crate::cli_cfg::app_cli_cfg::sub_cli_cfg::configure_all"
        );
    }
}
