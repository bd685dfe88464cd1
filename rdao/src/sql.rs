//! Statement assembly for partial writes.
//!
//! Full-width statements are rendered into generated DAOs as string
//! constants. The `*_none_zero` operations only learn which columns take
//! part at call time, so they assemble the same statement shapes here.

/// Quote an identifier with backticks.
pub fn ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// `INSERT INTO t (a, b) VALUES (?, ?)`
pub fn insert(table: &str, columns: &[&str]) -> String {
    let names: Vec<String> = columns.iter().map(|c| ident(c)).collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        ident(table),
        names.join(", "),
        placeholders
    )
}

/// `INSERT ... ON DUPLICATE KEY UPDATE a = VALUES(a)` for every non-key column.
///
/// When only key columns are written the update clause re-assigns the
/// first key to itself, which keeps the statement valid and turns a
/// conflict into a no-op.
pub fn upsert(table: &str, columns: &[&str], keys: &[&str]) -> String {
    let mut updates: Vec<String> = columns
        .iter()
        .filter(|c| !keys.contains(*c))
        .map(|c| format!("{0} = VALUES({0})", ident(c)))
        .collect();
    if updates.is_empty() {
        if let Some(key) = keys.first().or(columns.first()) {
            updates.push(format!("{0} = {0}", ident(key)));
        }
    }
    format!(
        "{} ON DUPLICATE KEY UPDATE {}",
        insert(table, columns),
        updates.join(", ")
    )
}

/// `UPDATE t SET a = ?, b = ?`; the caller appends the WHERE clause.
pub fn update(table: &str, columns: &[&str]) -> String {
    let sets: Vec<String> = columns.iter().map(|c| format!("{} = ?", ident(c))).collect();
    format!("UPDATE {} SET {}", ident(table), sets.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert() {
        assert_eq!(
            insert("user", &["name", "age"]),
            "INSERT INTO `user` (`name`, `age`) VALUES (?, ?)"
        );
    }

    #[test]
    fn test_upsert_skips_keys_in_update_clause() {
        assert_eq!(
            upsert("user", &["id", "name"], &["id"]),
            "INSERT INTO `user` (`id`, `name`) VALUES (?, ?) ON DUPLICATE KEY UPDATE `name` = VALUES(`name`)"
        );
        assert_eq!(
            upsert("user", &["id"], &["id"]),
            "INSERT INTO `user` (`id`) VALUES (?) ON DUPLICATE KEY UPDATE `id` = `id`"
        );
    }

    #[test]
    fn test_update() {
        assert_eq!(
            update("user", &["name", "age"]),
            "UPDATE `user` SET `name` = ?, `age` = ?"
        );
    }
}
