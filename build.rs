//! Build script for texstream.
//!
//! Validates the WGSL shader at build time so shader errors surface as
//! compile errors instead of runtime panics inside wgpu.

const SHADER_PATH: &str = "src/graphics/shaders/stream.wgsl";

fn main() {
    println!("cargo:rerun-if-changed={SHADER_PATH}");

    let source = std::fs::read_to_string(SHADER_PATH)
        .unwrap_or_else(|e| panic!("Failed to read {SHADER_PATH}: {e}"));

    if let Err(e) = validate_shader(&source, "stream.wgsl") {
        panic!("Shader validation failed:\n{e}");
    }
}

/// Validate a shader using naga
fn validate_shader(source: &str, name: &str) -> Result<(), String> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| format!("WGSL parse error for {}: {:?}", name, e))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );

    validator
        .validate(&module)
        .map_err(|e| format!("Validation error for {}: {:?}", name, e))?;

    Ok(())
}
