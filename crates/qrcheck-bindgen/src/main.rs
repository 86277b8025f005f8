use std::env;

/// Generates the Kotlin bindings used by the Android host, or Swift when asked for it
fn main() {
    let wants_swift = env::args().any(|arg| arg.to_lowercase().contains("swift"));

    if wants_swift {
        uniffi::uniffi_bindgen_swift();
    } else {
        uniffi::uniffi_bindgen_main();
    }
}
