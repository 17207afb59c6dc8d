//! End-to-end tests driving `metang` through its library entry points.

use std::fs;

use metang::{Error, Options};
use metang_mem::{ArenaError, ArenaFactory};

fn options(args: &[&str]) -> Options {
    Options::parse_from(std::iter::once("metang").chain(args.iter().copied())).unwrap()
}

fn generate(args: &[&str], input: &str) -> String {
    let mut out = Vec::new();
    metang::run(&options(args), input.as_bytes(), &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

const STARTERS: &str = "\
# Generation I starters
Bulbasaur
Ivysaur
Venusaur   # last of the line
";

#[test]
fn test_c_enum_full_output() {
    let out = generate(
        &["enum", "-l", "species", "-t", "species", "-o", "include/species.h"],
        STARTERS,
    );

    let expected = r#"/*
 * This file was generated by metang; DO NOT MODIFY IT!!
 * Base command: enum
 * Source file: <stdin>
 * Program options:
 *   --leader species
 *   --tag-name species
 */

#ifndef METANG_SPECIES_H
#define METANG_SPECIES_H

#ifdef __cplusplus
extern "C" {
#endif

#ifdef METANG_ENUM

enum species {
    SPECIES_BULBASAUR = 0,
    SPECIES_IVYSAUR   = 1,
    SPECIES_VENUSAUR  = 2,
};

#else

#define SPECIES_BULBASAUR 0
#define SPECIES_IVYSAUR   1
#define SPECIES_VENUSAUR  2

#endif /* METANG_ENUM */

#ifdef METANG_LOOKUP

typedef struct entry__species {
    const long value;
    const char *def;
} entry__species;

#ifndef METANG_LOOKUP_IMPL

extern const long lengthof__species;
extern const entry__species lookup__species[];

#else

const long lengthof__species = 3;
const entry__species lookup__species[] = {
    { SPECIES_BULBASAUR, "SPECIES_BULBASAUR", },
    { SPECIES_IVYSAUR,   "SPECIES_IVYSAUR",   },
    { SPECIES_VENUSAUR,  "SPECIES_VENUSAUR",  },
};

#endif /* METANG_LOOKUP_IMPL */

#endif /* METANG_LOOKUP */

#ifdef __cplusplus
}
#endif

#endif /* METANG_SPECIES_H */
"#;

    assert_eq!(out, expected);
}

#[test]
fn test_c_enum_overrides_and_sorted_lookup() {
    let out = generate(&["enum", "-t", "pokemon", "-n", "41"], "Zubat\nAbra = 63\nMew\n");

    assert!(out.contains(" *   --tag-name pokemon\n *   --start-from 41\n */\n"));
    assert!(out.contains("#ifndef METANG_POKEMON_H\n"));
    assert!(out.contains("    ZUBAT = 41,\n    ABRA  = 63,\n    MEW   = 64,\n"));
    assert!(out.contains("#define ZUBAT 41\n#define ABRA  63\n#define MEW   64\n"));
    assert!(out.contains("const long lengthof__pokemon = 3;\n"));
    assert!(out.contains(concat!(
        "    { ABRA,  \"ABRA\",  },\n",
        "    { MEW,   \"MEW\",   },\n",
        "    { ZUBAT, \"ZUBAT\", },\n",
    )));
}

#[test]
fn test_c_mask() {
    let out = generate(
        &["mask", "-l", "status", "-t", "status", "-G", "pokeplat"],
        "poison\nburn\nfreeze\n",
    );

    assert!(out.contains(" * Base command: mask\n"));
    assert!(out.contains("#ifndef POKEPLAT_STATUS_H\n"));
    assert!(out.contains("#ifdef POKEPLAT_ENUM\n"));
    assert!(out.contains("#ifndef POKEPLAT_LOOKUP_IMPL\n"));
    assert!(out.contains(concat!(
        "    STATUS_NONE   =        0,\n",
        "    STATUS_POISON =  (1 << 0),\n",
        "    STATUS_BURN   =  (1 << 1),\n",
        "    STATUS_FREEZE =  (1 << 2),\n",
        "    STATUS_ANY    = ((1 << 3) - 1),\n",
    )));
    assert!(out.contains(concat!(
        "#define STATUS_NONE          0\n",
        "#define STATUS_POISON  (1 << 0)\n",
        "#define STATUS_BURN    (1 << 1)\n",
        "#define STATUS_FREEZE  (1 << 2)\n",
        "#define STATUS_ANY    ((1 << 3) - 1)\n",
    )));
    assert!(out.contains(concat!(
        "    { STATUS_ANY,    \"STATUS_ANY\",    },\n",
        "    { STATUS_BURN,   \"STATUS_BURN\",   },\n",
        "    { STATUS_FREEZE, \"STATUS_FREEZE\", },\n",
        "    { STATUS_NONE,   \"STATUS_NONE\",   },\n",
        "    { STATUS_POISON, \"STATUS_POISON\", },\n",
    )));
    assert!(out.ends_with("#endif /* POKEPLAT_STATUS_H */\n"));
}

#[test]
fn test_empty_guard() {
    let out = generate(&["enum", "-t", "bare", "-G", ""], "ONE\n");

    assert!(out.contains(" *   --guard \n"));
    assert!(out.contains("#ifndef BARE_H\n"));
    assert!(out.contains("#ifdef ENUM\n"));
    assert!(out.contains("#ifdef LOOKUP\n"));
}

#[test]
fn test_python_mask_full_output() {
    let out = generate(&["mask", "-L", "py", "-t", "Status"], "poison\nburn\n");

    let expected = r#""""
    This file was generated by metang; DO NOT MODIFY IT!!
    Base command: mask
    Source file: <stdin>
    Program options:
      --lang py
      --tag-name Status
"""

import enum

class Status(enum.IntFlag):
    NONE   =        0
    POISON =  (1 << 0)
    BURN   =  (1 << 1)
    ANY    = ((1 << 2) - 1)
"#;

    assert_eq!(out, expected);
}

#[test]
fn test_python_enum_with_listing_options() {
    let out = generate(
        &["enum", "-L", "py", "-l", "item", "-p", "none", "-a", "count", "-t", "Item"],
        "potion\nsuper potion\n",
    );

    assert!(out.contains(concat!(
        "      --lang py\n",
        "      --leader item\n",
        "      --tag-name Item\n",
        "      --append count\n",
        "      --prepend none\n",
        "\"\"\"\n",
    )));
    assert!(out.contains("class Item(enum.IntEnum):\n"));
    assert!(out.ends_with(concat!(
        "    ITEM_NONE         = 0\n",
        "    ITEM_POTION       = 1\n",
        "    ITEM_SUPER_POTION = 2\n",
        "    ITEM_COUNT        = 3\n",
    )));
}

#[test]
fn test_input_errors_carry_line_numbers() {
    let mut out = Vec::new();
    let err = metang::run(&options(&["enum", "-t", "dup"]), "A\n\n# gap\nB\na\n".as_bytes(), &mut out)
        .unwrap_err();

    assert!(matches!(err, Error::Input { line: 5, .. }));
    assert_eq!(err.to_string(), "line 5: duplicate identifier A (also defined by line 1)");
    assert_eq!(err.exit_code(), 1);
    assert!(out.is_empty());
}

#[test]
fn test_stdin_requires_tag_name() {
    let err = Options::parse_from(["metang", "enum"]).unwrap_err();
    assert!(matches!(err, Error::Usage(_)));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_execute_with_files() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("colors.txt");
    let output = dir.path().join("gen").join("colors.h");
    fs::create_dir(dir.path().join("gen")).unwrap();
    fs::write(&input, "red\ngreen\nblue\n").unwrap();

    let opts = options(&[
        "enum",
        "-o",
        output.to_str().unwrap(),
        input.to_str().unwrap(),
    ]);
    metang::execute(&opts).unwrap();

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.contains(&format!(" * Source file: {}\n", input.display())));
    assert!(text.contains("#ifndef METANG_COLORS_H\n"));
    assert!(text.contains("enum colors {\n"));
    assert!(text.contains("const long lengthof__colors = 3;\n"));
}

#[test]
fn test_execute_failure_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.txt");
    let output = dir.path().join("broken.h");
    fs::write(&input, "ok\nnot = valid\n").unwrap();

    let opts = options(&["enum", "-o", output.to_str().unwrap(), input.to_str().unwrap()]);
    let err = metang::execute(&opts).unwrap_err();

    assert!(matches!(err, Error::Input { line: 2, .. }));
    assert!(!output.exists());
}

#[test]
fn test_execute_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.txt");

    let err = metang::execute(&options(&["enum", missing.to_str().unwrap()])).unwrap_err();

    assert!(matches!(err, Error::Open { ref path, .. } if *path == missing));
    assert!(err.to_string().starts_with("could not open"));
}

#[test]
fn test_tab_indented_lines() {
    let out = generate(&["enum", "-L", "py", "-t", "Moves"], "\tTACKLE\n \tGROWL # second\n");

    assert!(out.ends_with("    TACKLE = 0\n    GROWL  = 1\n"));
}

#[test]
fn test_exhausted_input_pass() {
    let factory = ArenaFactory::new(16, 64);
    let mut out = Vec::new();

    let err = metang::run_with(&factory, &options(&["enum", "-t", "species"]), STARTERS.as_bytes(), &mut out)
        .unwrap_err();

    assert!(matches!(err, Error::Arena(ArenaError::Exhausted { .. })));
    assert_eq!(err.to_string(), "allocation failure");
    assert_eq!(err.exit_code(), 1);
    assert!(out.is_empty());
}

#[test]
fn test_exhausted_render_pass() {
    // Enough for one listing line, not for a whole header.
    let factory = ArenaFactory::new(64, 512);
    let mut out = Vec::new();

    let err = metang::run_with(&factory, &options(&["enum", "-t", "one"]), "A\n".as_bytes(), &mut out)
        .unwrap_err();

    assert!(matches!(err, Error::Arena(ArenaError::Exhausted { .. })));
    assert_eq!(err.to_string(), "allocation failure");
    assert!(out.is_empty());
}

#[test]
fn test_execute_exhausted_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("species.txt");
    let output = dir.path().join("species.h");
    fs::write(&input, STARTERS).unwrap();

    let opts = options(&["enum", "-o", output.to_str().unwrap(), input.to_str().unwrap()]);
    let err = metang::execute_with(&ArenaFactory::new(16, 64), &opts).unwrap_err();

    assert!(matches!(err, Error::Arena(_)));
    assert_eq!(err.exit_code(), 1);
    assert!(!output.exists());
}
