//! Compiles `proto/park.proto` into tonic server and client code.
//!
//! The descriptor set is produced by `protox`, so no system `protoc` is needed.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto/park.proto");

    let descriptors = protox::compile(["proto/park.proto"], ["proto"])?;
    tonic_prost_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_fds(descriptors)?;

    Ok(())
}
