//! Compare a `.env` file against its `.env.example`.

use std::collections::HashSet;

use envi_codec::EnvDocument;

/// Comment written above variables appended by `--fix`.
pub const FIX_COMMENT: &str = "# Added automatically by envi validate";

/// A variable present in the example but not in the env file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingVariable {
    pub name: String,
    /// Value from the example file.
    pub value: Vec<u8>,
}

/// Variables of `example` whose names do not appear in `env`, in example order.
pub fn missing_variables(env: &[u8], example: &[u8]) -> Vec<MissingVariable> {
    let env = EnvDocument::parse(env);
    let mut seen: HashSet<String> = env.assignments().map(|a| a.name().into_owned()).collect();

    EnvDocument::parse(example)
        .assignments()
        .filter_map(|assignment| {
            let name = assignment.name().into_owned();
            if name.is_empty() || !seen.insert(name.clone()) {
                return None;
            }
            Some(MissingVariable {
                name,
                value: assignment.value().to_vec(),
            })
        })
        .collect()
}

/// Names assigned in `env` but absent from `example`, in env order.
pub fn extra_variables(env: &[u8], example: &[u8]) -> Vec<String> {
    let mut seen: HashSet<String> = EnvDocument::parse(example)
        .assignments()
        .map(|a| a.name().into_owned())
        .collect();

    EnvDocument::parse(env)
        .assignments()
        .map(|a| a.name().into_owned())
        .filter(|name| !name.is_empty() && seen.insert(name.clone()))
        .collect()
}

/// Names whose value is empty or whitespace only.
pub fn empty_variables(env: &[u8]) -> Vec<String> {
    let mut seen = HashSet::new();

    EnvDocument::parse(env)
        .assignments()
        .filter(|a| a.value().trim_ascii().is_empty())
        .map(|a| a.name().into_owned())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Entries of `required` that `env` does not assign.
pub fn missing_required(env: &[u8], required: &[String]) -> Vec<String> {
    let present: HashSet<String> = EnvDocument::parse(env)
        .assignments()
        .map(|a| a.name().into_owned())
        .collect();

    required
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty() && !present.contains(*name))
        .map(str::to_string)
        .collect()
}

/// Append `missing` to `env` under a marker comment.
pub fn append_missing(env: &[u8], missing: &[MissingVariable]) -> Vec<u8> {
    let mut out = env.to_vec();
    if missing.is_empty() {
        return out;
    }

    if !out.is_empty() && !out.ends_with(b"\n") {
        out.push(b'\n');
    }
    out.push(b'\n');
    out.extend_from_slice(FIX_COMMENT.as_bytes());
    out.push(b'\n');
    for variable in missing {
        out.extend_from_slice(variable.name.as_bytes());
        out.push(b'=');
        out.extend_from_slice(&variable.value);
        out.push(b'\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &[u8] = b"# required\nDB_HOST=localhost\nDB_PORT=5432\nAPI_KEY=\nDB_HOST=dup\n";

    #[test]
    fn test_nothing_missing() {
        let env = b"DB_HOST=prod\nDB_PORT=6543\nAPI_KEY=secret\n";
        assert!(missing_variables(env, EXAMPLE).is_empty());
    }

    #[test]
    fn test_missing_in_example_order() {
        let env = b"DB_PORT=6543\n";
        let missing = missing_variables(env, EXAMPLE);
        let names: Vec<_> = missing.iter().map(|m| m.name.as_str()).collect();

        assert_eq!(names, vec!["DB_HOST", "API_KEY"]);
        assert_eq!(missing[0].value, b"localhost");
    }

    #[test]
    fn test_masked_env_keeps_names_visible() {
        let env = b"# ENVI_MASKED_ENCRYPTION_V1\nDB_HOST=ENVI_MASKED[AAAA]\nDB_PORT=ENVI_MASKED[BBBB]\nAPI_KEY=\n";
        assert!(missing_variables(env, EXAMPLE).is_empty());
    }

    #[test]
    fn test_extra_variables() {
        let env = b"DB_HOST=prod\nDEBUG=1\nexport LOCAL_ONLY=x\nDEBUG=2\n";
        assert_eq!(extra_variables(env, EXAMPLE), vec!["DEBUG", "LOCAL_ONLY"]);
        assert!(extra_variables(b"DB_HOST=prod\n", EXAMPLE).is_empty());
    }

    #[test]
    fn test_empty_variables() {
        let env = b"A=1\nB=\nC=   \n# D=\nB=\n";
        assert_eq!(empty_variables(env), vec!["B", "C"]);
    }

    #[test]
    fn test_missing_required() {
        let env = b"DB_HOST=prod\nAPI_KEY=\n";
        let required = vec!["DB_HOST".to_string(), " API_KEY ".to_string(), "SECRET".to_string(), String::new()];

        assert_eq!(missing_required(env, &required), vec!["SECRET"]);
        assert!(missing_required(env, &[]).is_empty());
    }

    #[test]
    fn test_append_adds_separator() {
        let missing = vec![MissingVariable {
            name: "API_KEY".to_string(),
            value: b"changeme".to_vec(),
        }];

        let fixed = append_missing(b"DB_HOST=prod", &missing);
        let expected = format!("DB_HOST=prod\n\n{}\nAPI_KEY=changeme\n", FIX_COMMENT);
        assert_eq!(fixed, expected.as_bytes());
    }

    #[test]
    fn test_append_nothing_is_identity() {
        assert_eq!(append_missing(b"A=1", &[]), b"A=1");
    }
}
