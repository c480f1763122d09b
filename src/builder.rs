//! The SQL builder contract consumed from the environment: only its
//! rendering and cloning behavior is assumed here, not its implementation.

/// A query builder that can render itself to SQL and be cheaply cloned and
/// refined. The tagged-literal helper used upstream to splice raw predicate
/// text has no Rust counterpart (no tagged-template literals); `where_`
/// takes a plain `&str` instead.
pub trait QueryBuilder: Send + Sync {
    fn to_sql(&self) -> String;
    fn clone_box(&self) -> Box<dyn QueryBuilder>;
    fn from_text(&mut self, text: &str);
    fn select(&mut self, columns: &[&str]);
    fn where_(&mut self, predicate: &str);
    fn limit(&mut self, n: u64);
    fn offset(&mut self, n: u64);
}

impl Clone for Box<dyn QueryBuilder> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// The builder a `QueryValue` constructs internally when it is given raw
/// SQL text instead of a [`QueryBuilder`]: the text is wrapped as
/// `SELECT * FROM (...) AS inputQuery-<rand>`. Refinements compose by
/// further wrapping, since plain text carries no structure to mutate in
/// place.
#[derive(Debug, Clone)]
pub(crate) struct TextQuery(String);

impl TextQuery {
    pub(crate) fn new(rendered: String) -> Self {
        Self(rendered)
    }
}

impl QueryBuilder for TextQuery {
    fn to_sql(&self) -> String {
        self.0.clone()
    }

    fn clone_box(&self) -> Box<dyn QueryBuilder> {
        Box::new(self.clone())
    }

    fn from_text(&mut self, text: &str) {
        self.0 = text.to_string();
    }

    fn select(&mut self, columns: &[&str]) {
        self.0 = format!("SELECT {} FROM ({}) AS t", columns.join(", "), self.0);
    }

    fn where_(&mut self, predicate: &str) {
        self.0 = format!("SELECT * FROM ({}) AS t WHERE {predicate}", self.0);
    }

    fn limit(&mut self, n: u64) {
        self.0 = format!("SELECT * FROM ({}) AS t LIMIT {n}", self.0);
    }

    fn offset(&mut self, n: u64) {
        self.0 = format!("SELECT * FROM ({}) AS t OFFSET {n}", self.0);
    }
}
