use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

const USER_COLUMNS: &str = "u.id, u.email, u.username, u.first_name, u.last_name, u.password_hash, u.created_at";
const RECIPE_COLUMNS: &str = "r.id, r.author_id, r.name, r.image, r.text, r.cooking_time, r.created_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Maps constraint failures onto the store's error vocabulary.
fn map_write_error(e: rusqlite::Error) -> Error {
    if let rusqlite::Error::SqliteFailure(err, _) = &e {
        if err.code == rusqlite::ErrorCode::ConstraintViolation {
            match err.extended_code {
                rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => return Error::NotFound,
                rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => return Error::AlreadyExists,
                _ => {}
            }
        }
    }
    Error::from(e)
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        password_hash: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

fn token_from_row(row: &Row<'_>) -> rusqlite::Result<Token> {
    Ok(Token {
        key: row.get(0)?,
        user_id: row.get(1)?,
        created_at: parse_datetime(&row.get::<_, String>(2)?),
    })
}

fn tag_from_row(row: &Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
        color: row.get(2)?,
        slug: row.get(3)?,
    })
}

fn ingredient_from_row(row: &Row<'_>) -> rusqlite::Result<Ingredient> {
    Ok(Ingredient {
        id: row.get(0)?,
        name: row.get(1)?,
        measurement_unit: row.get(2)?,
    })
}

fn recipe_from_row(row: &Row<'_>) -> rusqlite::Result<Recipe> {
    Ok(Recipe {
        id: row.get(0)?,
        author_id: row.get(1)?,
        name: row.get(2)?,
        image: row.get(3)?,
        text: row.get(4)?,
        cooking_time: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

fn recipe_ingredient_from_row(row: &Row<'_>) -> rusqlite::Result<RecipeIngredient> {
    Ok(RecipeIngredient {
        recipe_id: row.get(0)?,
        ingredient_id: row.get(1)?,
        name: row.get(2)?,
        measurement_unit: row.get(3)?,
        amount: row.get(4)?,
    })
}

fn query_recipe(conn: &Connection, id: i64) -> Result<Option<Recipe>> {
    conn.query_row(
        &format!("SELECT {RECIPE_COLUMNS} FROM recipes r WHERE r.id = ?1"),
        params![id],
        recipe_from_row,
    )
    .optional()
    .map_err(Error::from)
}

/// Inserts the tag and ingredient rows of a recipe. Callers clear old rows first.
fn insert_recipe_relations(conn: &Connection, recipe_id: i64, draft: &RecipeDraft) -> Result<()> {
    for tag_id in &draft.tag_ids {
        conn.execute(
            "INSERT INTO recipe_tags (recipe_id, tag_id) VALUES (?1, ?2)",
            params![recipe_id, tag_id],
        )
        .map_err(map_write_error)?;
    }

    for item in &draft.ingredients {
        conn.execute(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) VALUES (?1, ?2, ?3)",
            params![recipe_id, item.id, item.amount],
        )
        .map_err(map_write_error)?;
    }

    Ok(())
}

/// Builds the WHERE clause and its bound values for a recipe filter.
fn recipe_filter_clause(filter: &RecipeFilter) -> (String, Vec<Value>) {
    let mut clauses: Vec<&str> = Vec::new();
    let mut values = Vec::new();

    match &filter.author {
        Some(AuthorFilter::Id(author_id)) => {
            clauses.push("r.author_id = ?");
            values.push(Value::Integer(*author_id));
        }
        Some(AuthorFilter::Username(name)) => {
            clauses.push(
                "EXISTS (SELECT 1 FROM users u WHERE u.id = r.author_id
                         AND lower(u.username) LIKE '%' || ? || '%' ESCAPE '\\')",
            );
            values.push(Value::Text(escape_like(&name.to_lowercase())));
        }
        None => {}
    }

    for slug in &filter.tag_slugs {
        clauses.push(
            "EXISTS (SELECT 1 FROM recipe_tags rt JOIN tags t ON t.id = rt.tag_id
                     WHERE rt.recipe_id = r.id AND t.slug = ?)",
        );
        values.push(Value::Text(slug.clone()));
    }

    if let Some(user_id) = filter.favorited_by {
        clauses.push("EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ?)");
        values.push(Value::Integer(user_id));
    }

    if let Some(user_id) = filter.in_cart_of {
        clauses.push(
            "EXISTS (SELECT 1 FROM shopping_cart s WHERE s.recipe_id = r.id AND s.user_id = ?)",
        );
        values.push(Value::Integer(user_id));
    }

    let clause = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };

    (clause, values)
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // User operations

    fn create_user(&self, user: &NewUser) -> Result<User> {
        let created_at = Utc::now();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO users (email, username, first_name, last_name, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.email,
                user.username,
                user.first_name,
                user.last_name,
                user.password_hash,
                format_datetime(&created_at),
            ],
        )
        .map_err(map_write_error)?;

        Ok(User {
            id: conn.last_insert_rowid(),
            email: user.email.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            password_hash: user.password_hash.clone(),
            created_at,
        })
    }

    fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?1"),
            params![id],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.email = ?1"),
            params![email],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_users(&self, offset: i64, limit: i64) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users u ORDER BY u.id LIMIT ?1 OFFSET ?2"
        ))?;

        let rows = stmt.query_map(params![limit, offset], user_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn count_users(&self) -> Result<i64> {
        let conn = self.conn();
        conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .map_err(Error::from)
    }

    fn update_user_password(&self, id: i64, password_hash: &str) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE users SET password_hash = ?1 WHERE id = ?2",
            params![password_hash, id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_user(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Token operations

    fn create_token(&self, token: &Token) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO tokens (key, user_id, created_at) VALUES (?1, ?2, ?3)",
                params![token.key, token.user_id, format_datetime(&token.created_at)],
            )
            .map_err(map_write_error)?;
        Ok(())
    }

    fn get_token(&self, key: &str) -> Result<Option<Token>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT key, user_id, created_at FROM tokens WHERE key = ?1",
            params![key],
            token_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_user_token(&self, user_id: i64) -> Result<Option<Token>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT key, user_id, created_at FROM tokens WHERE user_id = ?1",
            params![user_id],
            token_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn delete_token(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM tokens WHERE key = ?1", params![key])?;
        Ok(rows > 0)
    }

    // Tag operations

    fn create_tag(&self, name: &str, color: &str, slug: &str) -> Result<Tag> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO tags (name, color, slug) VALUES (?1, ?2, ?3)",
            params![name, color, slug],
        )
        .map_err(map_write_error)?;

        Ok(Tag {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            color: color.to_string(),
            slug: slug.to_string(),
        })
    }

    fn get_tag(&self, id: i64) -> Result<Option<Tag>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, color, slug FROM tags WHERE id = ?1",
            params![id],
            tag_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_tags(&self) -> Result<Vec<Tag>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, name, color, slug FROM tags ORDER BY id")?;
        let rows = stmt.query_map([], tag_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Ingredient operations

    fn create_ingredient(&self, name: &str, measurement_unit: &str) -> Result<Ingredient> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO ingredients (name, measurement_unit) VALUES (?1, ?2)",
            params![name, measurement_unit],
        )?;

        Ok(Ingredient {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            measurement_unit: measurement_unit.to_string(),
        })
    }

    fn get_ingredient(&self, id: i64) -> Result<Option<Ingredient>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, measurement_unit FROM ingredients WHERE id = ?1",
            params![id],
            ingredient_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_ingredients(&self, search: Option<&str>) -> Result<Vec<Ingredient>> {
        let conn = self.conn();

        let Some(search) = search.filter(|s| !s.is_empty()) else {
            let mut stmt =
                conn.prepare("SELECT id, name, measurement_unit FROM ingredients ORDER BY name, id")?;
            let rows = stmt.query_map([], ingredient_from_row)?;
            return rows
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(Error::from);
        };

        let needle = escape_like(&search.to_lowercase());
        let mut stmt = conn.prepare(
            "SELECT id, name, measurement_unit FROM ingredients
             WHERE lower(name) LIKE '%' || ?1 || '%' ESCAPE '\\'
             ORDER BY CASE WHEN lower(name) LIKE ?1 || '%' ESCAPE '\\' THEN 0 ELSE 1 END, name, id",
        )?;
        let rows = stmt.query_map(params![needle], ingredient_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Recipe operations

    fn create_recipe(&self, author_id: i64, draft: &RecipeDraft) -> Result<Recipe> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO recipes (author_id, name, image, text, cooking_time, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                author_id,
                draft.name,
                draft.image,
                draft.text,
                draft.cooking_time,
                format_datetime(&Utc::now()),
            ],
        )
        .map_err(map_write_error)?;
        let recipe_id = tx.last_insert_rowid();

        insert_recipe_relations(&tx, recipe_id, draft)?;

        let recipe = query_recipe(&tx, recipe_id)?.ok_or(Error::NotFound)?;
        tx.commit()?;
        Ok(recipe)
    }

    fn get_recipe(&self, id: i64) -> Result<Option<Recipe>> {
        query_recipe(&self.conn(), id)
    }

    fn list_recipes(&self, filter: &RecipeFilter, offset: i64, limit: i64) -> Result<Vec<Recipe>> {
        let (clause, mut values) = recipe_filter_clause(filter);
        values.push(Value::Integer(limit));
        values.push(Value::Integer(offset));

        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes r{clause} ORDER BY r.id DESC LIMIT ? OFFSET ?"
        ))?;
        let rows = stmt.query_map(params_from_iter(values), recipe_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn count_recipes(&self, filter: &RecipeFilter) -> Result<i64> {
        let (clause, values) = recipe_filter_clause(filter);
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT COUNT(*) FROM recipes r{clause}"),
            params_from_iter(values),
            |row| row.get(0),
        )
        .map_err(Error::from)
    }

    fn update_recipe(&self, id: i64, draft: &RecipeDraft) -> Result<Recipe> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let rows = tx
            .execute(
                "UPDATE recipes SET name = ?1, image = ?2, text = ?3, cooking_time = ?4 WHERE id = ?5",
                params![draft.name, draft.image, draft.text, draft.cooking_time, id],
            )
            .map_err(map_write_error)?;
        if rows == 0 {
            return Err(Error::NotFound);
        }

        tx.execute("DELETE FROM recipe_tags WHERE recipe_id = ?1", params![id])?;
        tx.execute(
            "DELETE FROM recipe_ingredients WHERE recipe_id = ?1",
            params![id],
        )?;
        insert_recipe_relations(&tx, id, draft)?;

        let recipe = query_recipe(&tx, id)?.ok_or(Error::NotFound)?;
        tx.commit()?;
        Ok(recipe)
    }

    fn delete_recipe(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM recipes WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn list_recipe_tags(&self, recipe_id: i64) -> Result<Vec<Tag>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT t.id, t.name, t.color, t.slug
             FROM tags t
             JOIN recipe_tags rt ON t.id = rt.tag_id
             WHERE rt.recipe_id = ?1
             ORDER BY t.id",
        )?;
        let rows = stmt.query_map(params![recipe_id], tag_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_recipe_ingredients(&self, recipe_id: i64) -> Result<Vec<RecipeIngredient>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT ri.recipe_id, ri.ingredient_id, i.name, i.measurement_unit, ri.amount
             FROM recipe_ingredients ri
             JOIN ingredients i ON i.id = ri.ingredient_id
             WHERE ri.recipe_id = ?1
             ORDER BY ri.rowid",
        )?;
        let rows = stmt.query_map(params![recipe_id], recipe_ingredient_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_author_recipes(&self, author_id: i64, limit: Option<i64>) -> Result<Vec<Recipe>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes r WHERE r.author_id = ?1 ORDER BY r.id DESC LIMIT ?2"
        ))?;
        // SQLite treats a negative LIMIT as unbounded.
        let rows = stmt.query_map(params![author_id, limit.unwrap_or(-1)], recipe_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn count_author_recipes(&self, author_id: i64) -> Result<i64> {
        let conn = self.conn();
        conn.query_row(
            "SELECT COUNT(*) FROM recipes WHERE author_id = ?1",
            params![author_id],
            |row| row.get(0),
        )
        .map_err(Error::from)
    }

    // Favorite and shopping cart operations

    fn add_recipe_mark(&self, mark: RecipeMark, user_id: i64, recipe_id: i64) -> Result<()> {
        self.conn()
            .execute(
                &format!(
                    "INSERT INTO {} (user_id, recipe_id, created_at) VALUES (?1, ?2, ?3)",
                    mark.table()
                ),
                params![user_id, recipe_id, format_datetime(&Utc::now())],
            )
            .map_err(map_write_error)?;
        Ok(())
    }

    fn remove_recipe_mark(&self, mark: RecipeMark, user_id: i64, recipe_id: i64) -> Result<bool> {
        let rows = self.conn().execute(
            &format!(
                "DELETE FROM {} WHERE user_id = ?1 AND recipe_id = ?2",
                mark.table()
            ),
            params![user_id, recipe_id],
        )?;
        Ok(rows > 0)
    }

    fn has_recipe_mark(&self, mark: RecipeMark, user_id: i64, recipe_id: i64) -> Result<bool> {
        let conn = self.conn();
        conn.query_row(
            &format!(
                "SELECT EXISTS (SELECT 1 FROM {} WHERE user_id = ?1 AND recipe_id = ?2)",
                mark.table()
            ),
            params![user_id, recipe_id],
            |row| row.get(0),
        )
        .map_err(Error::from)
    }

    fn list_cart_ingredients(&self, user_id: i64) -> Result<Vec<RecipeIngredient>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT ri.recipe_id, ri.ingredient_id, i.name, i.measurement_unit, ri.amount
             FROM shopping_cart s
             JOIN recipe_ingredients ri ON ri.recipe_id = s.recipe_id
             JOIN ingredients i ON i.id = ri.ingredient_id
             WHERE s.user_id = ?1
             ORDER BY s.rowid, ri.rowid",
        )?;
        let rows = stmt.query_map(params![user_id], recipe_ingredient_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Subscription operations

    fn create_subscription(&self, user_id: i64, author_id: i64) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO subscriptions (user_id, author_id, created_at) VALUES (?1, ?2, ?3)",
                params![user_id, author_id, format_datetime(&Utc::now())],
            )
            .map_err(map_write_error)?;
        Ok(())
    }

    fn delete_subscription(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM subscriptions WHERE user_id = ?1 AND author_id = ?2",
            params![user_id, author_id],
        )?;
        Ok(rows > 0)
    }

    fn is_subscribed(&self, user_id: i64, author_id: i64) -> Result<bool> {
        let conn = self.conn();
        conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM subscriptions WHERE user_id = ?1 AND author_id = ?2)",
            params![user_id, author_id],
            |row| row.get(0),
        )
        .map_err(Error::from)
    }

    fn list_subscriptions(&self, user_id: i64, offset: i64, limit: i64) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS}
             FROM subscriptions s
             JOIN users u ON u.id = s.author_id
             WHERE s.user_id = ?1
             ORDER BY s.rowid DESC
             LIMIT ?2 OFFSET ?3"
        ))?;
        let rows = stmt.query_map(params![user_id, limit, offset], user_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn count_subscriptions(&self, user_id: i64) -> Result<i64> {
        let conn = self.conn();
        conn.query_row(
            "SELECT COUNT(*) FROM subscriptions WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .map_err(Error::from)
    }
}
