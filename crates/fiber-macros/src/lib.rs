use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{parse_macro_input, FnArg, Ident, ItemFn, LitStr, PatType, Type};

enum ParamRole {
    Props,
    Hooks,
}

/// Whether `ty` is `Hooks`, `&Hooks` or `&mut Hooks`, ignoring the path
/// prefix.
fn is_hooks_type(ty: &Type) -> bool {
    match ty {
        Type::Reference(reference) => is_hooks_type(&reference.elem),
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Hooks"),
        _ => false,
    }
}

fn param_roles(func: &ItemFn) -> syn::Result<Vec<ParamRole>> {
    let inputs = &func.sig.inputs;
    if inputs.len() > 2 {
        return Err(syn::Error::new_spanned(
            inputs,
            "components take at most `props` and `hooks`",
        ));
    }
    let mut roles = Vec::with_capacity(inputs.len());
    for (index, arg) in inputs.iter().enumerate() {
        match arg {
            FnArg::Receiver(receiver) => {
                return Err(syn::Error::new_spanned(
                    receiver,
                    "components cannot take `self`",
                ));
            }
            FnArg::Typed(PatType { ty, .. }) => {
                let role = if inputs.len() == 2 {
                    if index == 0 {
                        ParamRole::Props
                    } else {
                        ParamRole::Hooks
                    }
                } else if is_hooks_type(ty) {
                    ParamRole::Hooks
                } else {
                    ParamRole::Props
                };
                roles.push(role);
            }
        }
    }
    Ok(roles)
}

/// Turns a render function into a function returning a cached
/// `fiber_core::Component` handle.
///
/// The annotated function may take `(props, hooks)`, just one of them, or
/// nothing, and must return an `Element`. The generated function returns
/// the same handle on every call from one thread, so elements built from
/// it reconcile as the same component type across renders.
///
/// ```ignore
/// #[component]
/// fn Counter(props: &Props, hooks: &mut Hooks<'_>) -> Element { ... }
///
/// let root = element(Counter()).prop("start", 1).build();
/// ```
///
/// An optional string literal overrides the component's display name:
/// `#[component("counter")]`.
#[proc_macro_attribute]
pub fn component(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr_tokens = TokenStream2::from(attr);
    let func = parse_macro_input!(item as ItemFn);

    let name = if attr_tokens.is_empty() {
        LitStr::new(&func.sig.ident.to_string(), func.sig.ident.span())
    } else {
        match syn::parse2::<LitStr>(attr_tokens) {
            Ok(name) => name,
            Err(err) => return err.to_compile_error().into(),
        }
    };

    if !func.sig.generics.params.is_empty() {
        return syn::Error::new_spanned(&func.sig.generics, "components cannot be generic")
            .to_compile_error()
            .into();
    }
    if let Some(asyncness) = &func.sig.asyncness {
        return syn::Error::new_spanned(asyncness, "components cannot be async")
            .to_compile_error()
            .into();
    }

    let roles = match param_roles(&func) {
        Ok(roles) => roles,
        Err(err) => return err.to_compile_error().into(),
    };
    let args: Vec<TokenStream2> = roles
        .iter()
        .map(|role| match role {
            ParamRole::Props => quote! { __props },
            ParamRole::Hooks => quote! { __hooks },
        })
        .collect();

    let attrs = &func.attrs;
    let vis = &func.vis;
    let ident = &func.sig.ident;
    let inputs = &func.sig.inputs;
    let output = &func.sig.output;
    let block = &func.block;
    let render_ident = Ident::new(&format!("__render_{ident}"), Span::call_site());

    let expanded = quote! {
        #(#attrs)*
        #[allow(non_snake_case)]
        #vis fn #ident() -> ::fiber_core::Component {
            #[allow(non_snake_case)]
            fn #render_ident(#inputs) #output #block

            thread_local! {
                static __COMPONENT: ::fiber_core::Component =
                    ::fiber_core::Component::new(#name, |__props, __hooks| {
                        #render_ident(#(#args),*)
                    });
            }
            __COMPONENT.with(::std::clone::Clone::clone)
        }
    };

    expanded.into()
}
