//! Declaration model: the intermediate representation built by one pass

pub mod arg;
pub mod declaration;

pub use arg::{
    ArgDeclaration, ArgGroupDeclaration, ArgKind, Binding, InjectionPoint, ScopeType, TypeInfo,
    UnmatchedBinding,
};
pub use declaration::{
    CommandDeclaration, Declaration, DeclarationKind, OwningScope, SyntheticContainer, Visibility,
};
