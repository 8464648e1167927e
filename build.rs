use std::env;
use std::path::Path;

const REQUIRED_TEMPLATES: [&str; 4] = [
    "components/boundary.svg",
    "components/entity.svg",
    "components/controller.svg",
    "selection/component-selected.svg",
];

fn main() {
    println!("cargo:rerun-if-changed=assets/templates");

    let manifest_dir = env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR missing");
    let templates_dir = Path::new(&manifest_dir).join("assets/templates");

    for template in REQUIRED_TEMPLATES {
        if !templates_dir.join(template).is_file() {
            panic!(
                "Missing assets/templates/{template}. The bundled glyph templates must be present before building rdlt-draw."
            );
        }
    }

    let canonical = templates_dir
        .canonicalize()
        .unwrap_or_else(|_| templates_dir.clone());

    println!(
        "cargo:rustc-env=RDLT_BUNDLED_TEMPLATES={}",
        canonical.display()
    );
}
