fn main() {
    // Generated DAOs and the client are compiled into the library (via
    // include!) next to the declarations they were generated from
    rdao_codegen::generate_from_cargo_metadata().expect("codegen failed");
}
