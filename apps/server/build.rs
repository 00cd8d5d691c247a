use dotenvy::dotenv_iter;

// Bake values from a local .env in as compile-time defaults; the real
// environment still wins at runtime.
fn main() {
    println!("cargo:rerun-if-changed=.env");

    let Ok(entries) = dotenv_iter() else {
        return;
    };

    for (k, v) in entries.flatten() {
        println!("cargo:rustc-env={k}={v}");
    }
}
