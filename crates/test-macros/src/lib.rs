use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemFn, LitInt, parse_macro_input};

/// A `#[test]` wrapper that reports elapsed wall-clock time and fails any
/// test exceeding a timeout (default: 2 seconds).
///
/// The optional attribute argument overrides the timeout in seconds.
/// Setting the `TIMED_TEST_SLACK` environment variable to an integer
/// multiplies every timeout by that factor, for slow CI machines.
///
/// # Usage
/// ```ignore
/// use test_macros::timed_test;
///
/// #[timed_test]
/// fn fast_test() {
///     assert_eq!(1 + 1, 2);
/// }
///
/// #[timed_test(120)]
/// fn long_training_run() {
///     // gets a 120-second budget
/// }
/// ```
#[proc_macro_attribute]
pub fn timed_test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let limit_secs: u64 = if attr.is_empty() {
        2
    } else {
        let lit = parse_macro_input!(attr as LitInt);
        lit.base10_parse::<u64>()
            .expect("timed_test takes an integer timeout in seconds")
    };

    let func = parse_macro_input!(item as ItemFn);
    let name = &func.sig.ident;
    let body = &func.block;
    let attrs = &func.attrs;
    let vis = &func.vis;

    let expanded = quote! {
        #(#attrs)*
        #[test]
        #vis fn #name() {
            let __slack: u32 = ::std::env::var("TIMED_TEST_SLACK")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1);
            let __limit = ::std::time::Duration::from_secs(#limit_secs) * __slack;

            let __start = ::std::time::Instant::now();
            let __outcome = ::std::panic::catch_unwind(
                ::std::panic::AssertUnwindSafe(|| #body),
            );
            let __elapsed = __start.elapsed();

            eprintln!("[timed] {}: {} ms", stringify!(#name), __elapsed.as_millis());

            if let ::std::result::Result::Err(__payload) = __outcome {
                ::std::panic::resume_unwind(__payload);
            }

            assert!(
                __elapsed <= __limit,
                "[timed] {} ran {} ms, limit {} ms",
                stringify!(#name),
                __elapsed.as_millis(),
                __limit.as_millis(),
            );
        }
    };

    expanded.into()
}
