use std::path::Path;

fn main() {
    let catalog_path = Path::new("catalogs/builds.json");
    validate_catalog_file(catalog_path);
    set_build_dependencies();
}

fn validate_catalog_file(catalog_path: &Path) {
    // Ensure catalog exists at build time
    assert!(
        catalog_path.exists(),
        "\n\nCATALOG BUILD ERROR: File not found\n\
         Path: {}\n\
         Please create the catalog file before building.\n",
        catalog_path.display()
    );

    // Read catalog file
    let catalog_contents = std::fs::read_to_string(catalog_path).unwrap_or_else(|e| {
        panic!(
            "\n\nCATALOG BUILD ERROR: Failed to read file\n\
             Path: {}\n\
             Error: {e}\n",
            catalog_path.display()
        );
    });

    // Parse and validate JSON
    let catalog: serde_json::Value = serde_json::from_str(&catalog_contents).unwrap_or_else(|e| {
        panic!(
            "\n\nCATALOG BUILD ERROR: Invalid JSON\n\
             Path: {}\n\
             Error: {e}\n\
             Hint: Check for missing commas, brackets, or invalid syntax.\n",
            catalog_path.display()
        );
    });

    validate_catalog_structure(&catalog);
}

fn validate_catalog_structure(catalog: &serde_json::Value) {
    // Validate structure
    assert!(
        catalog.is_object(),
        "\n\nCATALOG BUILD ERROR: Root must be a JSON object\n\
         Got: {catalog}\n"
    );

    let builds = catalog.get("builds").unwrap_or_else(|| {
        panic!(
            "\n\nCATALOG BUILD ERROR: Missing 'builds' field\n\
             The catalog must have a top-level 'builds' array.\n"
        );
    });

    let builds = builds.as_array().unwrap_or_else(|| {
        panic!(
            "\n\nCATALOG BUILD ERROR: 'builds' must be an array\n\
             Got: {builds}\n"
        );
    });

    // Validate each build
    let total_predicates = validate_builds(builds);

    println!(
        "cargo:warning=Validated catalog: {} builds, {total_predicates} total contig predicates",
        builds.len()
    );
}

fn validate_builds(builds: &[serde_json::Value]) -> usize {
    let mut total_predicates = 0;

    for (i, build) in builds.iter().enumerate() {
        let build_id = build
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or("<unknown>");

        validate_build_fields(build, build_id, i);
        total_predicates += validate_build_contigs(build, build_id);
    }

    total_predicates
}

fn validate_build_fields(build: &serde_json::Value, build_id: &str, index: usize) {
    assert!(
        build.get("id").is_some(),
        "\n\nCATALOG BUILD ERROR: Build at index {index} missing 'id' field\n"
    );
    assert!(
        build.get("organism").is_some(),
        "\n\nCATALOG BUILD ERROR: Build '{build_id}' (index {index}) missing 'organism' field\n"
    );
    assert!(
        build.get("version").is_some(),
        "\n\nCATALOG BUILD ERROR: Build '{build_id}' (index {index}) missing 'version' field\n"
    );
    assert!(
        build.get("contigs").is_some(),
        "\n\nCATALOG BUILD ERROR: Build '{build_id}' (index {index}) missing 'contigs' field\n"
    );
}

fn validate_build_contigs(build: &serde_json::Value, build_id: &str) -> usize {
    if let Some(contigs) = build.get("contigs").and_then(|c| c.as_array()) {
        // A build with no predicates can never match anything
        assert!(
            !contigs.is_empty(),
            "\n\nCATALOG BUILD ERROR: Build '{build_id}' has an empty 'contigs' array\n"
        );

        for (j, contig) in contigs.iter().enumerate() {
            validate_contig_predicate(contig, build_id, j);
        }
        contigs.len()
    } else {
        0
    }
}

fn validate_contig_predicate(contig: &serde_json::Value, build_id: &str, index: usize) {
    // A predicate is either a name+length pair or an md5 checksum
    if contig.get("md5").is_some() {
        let md5 = contig.get("md5").and_then(|v| v.as_str()).unwrap_or("");
        assert!(
            md5.len() == 32 && md5.bytes().all(|b| b.is_ascii_hexdigit()),
            "\n\nCATALOG BUILD ERROR: Build '{build_id}' contig predicate {index} has a malformed 'md5' value\n\
             Expected 32 hex characters, got: '{md5}'\n"
        );
        return;
    }

    let contig_name = contig
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or("<unknown>");

    assert!(
        contig.get("name").is_some(),
        "\n\nCATALOG BUILD ERROR: Build '{build_id}' contig predicate {index} missing both 'name' and 'md5'\n"
    );

    let length = contig.get("length");
    assert!(
        length.is_some(),
        "\n\nCATALOG BUILD ERROR: Build '{build_id}' contig '{contig_name}' (index {index}) missing 'length' field\n"
    );

    // Validate length is positive
    if let Some(len) = length.and_then(serde_json::Value::as_u64) {
        assert!(
            len > 0,
            "\n\nCATALOG BUILD ERROR: Build '{build_id}' contig '{contig_name}' has zero length\n\
             Contig predicates must have length > 0.\n"
        );
    }
}

fn set_build_dependencies() {
    // Tell cargo to rerun if catalog changes
    println!("cargo:rerun-if-changed=catalogs/builds.json");

    // Tell cargo to rerun if build.rs changes
    println!("cargo:rerun-if-changed=build.rs");
}
