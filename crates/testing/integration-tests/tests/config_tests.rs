//! Driver configuration loaded from disk

use anyhow::Result;
use integration_tests::TestFixture;
use kl_driver::{CONFIG_FILE_NAME, LowerConfig};
use kl_syntax::TypeRef;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_config_file_drives_lowering() -> Result<()> {
    let dir = TempDir::new()?;
    fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        "module_name = \"app\"\nmangle_separator = \"::\"\n",
    )?;

    let mut fixture = TestFixture::new();
    fixture.config = LowerConfig::find_in_dir(dir.path())?;
    fixture.add_file("main.ts", |f| {
        vec![f.namespace(
            "Util",
            vec![f.function(
                "id",
                vec![f.param("x", TypeRef::Number)],
                Some(TypeRef::Number),
                vec![f.ret(Some(f.ident("x")))],
            )],
        )]
    });

    let lowered = fixture.lower()?;
    assert_eq!(lowered.module.name(), "app");
    assert!(lowered.module.function_by_name("Util::id").is_some());
    assert!(lowered.module.to_string().starts_with("; ModuleID = 'app'\n"));
    Ok(())
}

#[test]
fn test_invalid_config_file() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, "verify_module = \"yes\"\n")?;

    let err = LowerConfig::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains(CONFIG_FILE_NAME));
    Ok(())
}
