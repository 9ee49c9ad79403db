//! Build script compiling the Pipeline Inspector gRPC schema.

use std::env;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=proto/pipeline_inspector.proto");
    println!("cargo:rerun-if-env-changed=PROTOC");

    // Prefer an operator-supplied protoc, fall back to the vendored binary.
    if env::var_os("PROTOC").is_none() {
        env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);
    }
    let well_known = protoc_bin_vendored::include_path()?;

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(
            &["proto/pipeline_inspector.proto"],
            &[PathBuf::from("proto"), well_known],
        )?;

    Ok(())
}
