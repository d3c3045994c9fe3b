use proptrans::LocaleTag;
use std::path::Path;
use unic_langid::LanguageIdentifier;

/// Validate file path exists and is readable
pub fn validate_file_path(path: &str) -> Result<(), String> {
    let path_obj = Path::new(path);

    if !path_obj.exists() {
        return Err(format!("File does not exist: {}", path));
    }

    if !path_obj.is_file() {
        return Err(format!("Path is not a file: {}", path));
    }

    Ok(())
}

/// Validate that the source is a `.properties` file we can read
pub fn validate_source_path(path: &str) -> Result<(), String> {
    validate_file_path(path)?;

    let is_properties = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("properties"));
    if !is_properties {
        return Err(format!(
            "Unsupported source file: {}. Expected a .properties file",
            path
        ));
    }

    Ok(())
}

/// Validate output directory exists or can be created
pub fn validate_output_path(path: &str) -> Result<(), String> {
    let path_obj = Path::new(path);

    if let Some(parent) = path_obj.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        return Err(format!("Cannot create output directory: {}", e));
    }

    Ok(())
}

/// Validate language code format using unic-langid (same as lib crate)
pub fn validate_language_code(lang: &str) -> Result<(), String> {
    if lang.is_empty() {
        return Err("Language code cannot be empty".to_string());
    }

    // Resource bundles spell regions with '_', BCP 47 with '-'
    match lang.replace('_', "-").parse::<LanguageIdentifier>() {
        Ok(_) => Ok(()),
        Err(_) => Err(format!(
            "Invalid language code format: {}. Expected valid BCP 47 language identifier",
            lang
        )),
    }
}

/// Parse a comma separated locale list such as `es,fr_CA, de`.
pub fn parse_locale_list(list: &str) -> Result<Vec<LocaleTag>, String> {
    let mut locales = Vec::new();
    for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        validate_language_code(part)?;
        let locale = LocaleTag::parse(part).map_err(|e| e.to_string())?;
        if !locales.contains(&locale) {
            locales.push(locale);
        }
    }

    if locales.is_empty() {
        return Err("At least one target locale is required".to_string());
    }

    Ok(locales)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_language_code() {
        assert!(validate_language_code("en").is_ok());
        assert!(validate_language_code("pt_BR").is_ok());
        assert!(validate_language_code("zh-Hant-TW").is_ok());
        assert!(validate_language_code("").is_err());
        assert!(validate_language_code("not a locale").is_err());
    }

    #[test]
    fn test_parse_locale_list() {
        let locales = parse_locale_list("es, fr-CA,es,,de").unwrap();
        let tags: Vec<&str> = locales.iter().map(LocaleTag::as_str).collect();
        assert_eq!(tags, vec!["es", "fr_CA", "de"]);

        assert!(parse_locale_list(" , ").is_err());
        assert!(parse_locale_list("es,??").is_err());
    }

    #[test]
    fn test_validate_source_path() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("messages.properties");
        let bad = dir.path().join("messages.json");
        std::fs::write(&good, "a=1\n").unwrap();
        std::fs::write(&bad, "{}").unwrap();

        assert!(validate_source_path(good.to_str().unwrap()).is_ok());
        let err = validate_source_path(bad.to_str().unwrap()).unwrap_err();
        assert!(err.contains("Expected a .properties file"));
        let missing = dir.path().join("missing.properties");
        assert!(validate_source_path(missing.to_str().unwrap()).is_err());
        assert!(validate_source_path(dir.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_validate_output_path_creates_parent() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("reports").join("run.json");
        assert!(validate_output_path(out.to_str().unwrap()).is_ok());
        assert!(dir.path().join("reports").is_dir());
        assert!(validate_output_path("report.json").is_ok());
    }
}
