use tracing::info;

/// Databases the document store keeps for itself.
pub const RESERVED_DATABASES: &[&str] = &["admin", "local", "config"];

/// Internal-schema table prefixes, MySQL.
pub const MYSQL_RESERVED_PREFIXES: &[&str] = &["sys_", "performance_", "innodb_"];

/// Internal-schema table prefixes, PostgreSQL.
pub const POSTGRES_RESERVED_PREFIXES: &[&str] = &["pg_", "sql_"];

pub fn is_reserved_database(name: &str) -> bool {
    RESERVED_DATABASES.contains(&name)
}

/// Case-sensitive prefix match.
pub fn has_reserved_prefix(name: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|prefix| name.starts_with(prefix))
}

pub fn user_databases(names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .filter(|name| {
            let reserved = is_reserved_database(name);
            if reserved {
                info!("Skipping system database: {}", name);
            }
            !reserved
        })
        .collect()
}

pub fn user_tables(names: Vec<String>, prefixes: &[&str]) -> Vec<String> {
    names
        .into_iter()
        .filter(|name| {
            let reserved = has_reserved_prefix(name, prefixes);
            if reserved {
                info!("Skipping system table: {}", name);
            }
            !reserved
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_user_databases_drops_reserved() {
        let names = vec!["app".into(), "admin".into(), "local".into(), "config".into()];
        assert_eq!(user_databases(names), vec!["app".to_string()]);
    }

    #[test]
    fn test_reserved_database_match_is_exact() {
        assert!(!is_reserved_database("admins"));
        assert!(!is_reserved_database("Admin"));
    }

    #[test]
    fn test_user_tables_prefix_is_case_sensitive() {
        let names = vec![
            "pg_stat".to_string(),
            "PG_upper".to_string(),
            "orders".to_string(),
            "sql_features".to_string(),
        ];
        assert_eq!(
            user_tables(names, POSTGRES_RESERVED_PREFIXES),
            vec!["PG_upper".to_string(), "orders".to_string()]
        );
    }

    #[test]
    fn test_mysql_prefixes() {
        assert!(has_reserved_prefix("innodb_index_stats", MYSQL_RESERVED_PREFIXES));
        assert!(has_reserved_prefix("performance_schema", MYSQL_RESERVED_PREFIXES));
        assert!(!has_reserved_prefix("system", MYSQL_RESERVED_PREFIXES));
        assert!(!has_reserved_prefix("users", MYSQL_RESERVED_PREFIXES));
    }

    proptest! {
        #[test]
        fn prop_user_tables_never_reserved(names in prop::collection::vec("(pg_|sql_|sys_)?[a-z_]{0,8}", 0..20)) {
            let kept = user_tables(names.clone(), POSTGRES_RESERVED_PREFIXES);
            for name in &kept {
                prop_assert!(!has_reserved_prefix(name, POSTGRES_RESERVED_PREFIXES));
            }
            let expected = names.iter().filter(|n| !n.starts_with("pg_") && !n.starts_with("sql_")).count();
            prop_assert_eq!(kept.len(), expected);
        }

        #[test]
        fn prop_user_databases_never_reserved(names in prop::collection::vec("(admin|local|config|app|shop)[a-z]{0,2}", 0..20)) {
            let kept = user_databases(names);
            prop_assert!(kept.iter().all(|n| !RESERVED_DATABASES.contains(&n.as_str())));
        }
    }
}
