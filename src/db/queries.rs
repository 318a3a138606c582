// My QUERY BUILDING system. Only used for the article
// listings, where the WHERE clause depends on which filters
// the request came with. Everything else is plain SQL.

use std::fmt;

pub enum Order {
  Asc,
  Desc
}

pub struct OrderBy {
  pub order: Order,
  pub field: String
}

impl OrderBy {
  pub fn new(order: Order, field: &str) -> Self {
    OrderBy {
      order,
      field: field.to_string()
    }
  }
}

// Decided to use the "builder pattern"
// they talk about in Rust docs for
// query building.
// The "q_" in front of field names is
// just because "where" is a reserved
// keyword in Rust.
// WHERE clauses are always glued with AND, the
// values go through "?" placeholders and are bound
// separately by the caller.
pub struct Query {
  q_fields: Vec<String>,
  q_from: String,
  q_where: Vec<String>,
  q_order: Option<OrderBy>,
  limit: Option<i64>,
  offset: Option<i64>,
}

impl Query {

  pub fn select(fields: &[&str], from: &str) -> Self {
    Query {
      q_fields: fields.iter().map(|f| f.to_string()).collect(),
      q_from: from.to_string(),
      q_where: Vec::new(),
      q_order: None,
      limit: None,
      offset: None
    }
  }

  pub fn count(from: &str) -> Self {
    Self::select(&["count(*)"], from)
  }

  pub fn where_and(mut self, clause: &str) -> Self {
    self.q_where.push(clause.to_string());
    self
  }

  pub fn order(mut self, order: OrderBy) -> Self {
    self.q_order = Some(order);
    self
  }

  pub fn limit(mut self, limit: i64) -> Self {
    self.limit = Some(limit);
    self
  }

  pub fn offset(mut self, offset: i64) -> Self {
    self.offset = Some(offset);
    self
  }

}

// Creating the query string is done by implementing
// the Display trait, which gives us ToString.
impl fmt::Display for Query {

  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "SELECT {} FROM {} ", self.q_fields.join(","), self.q_from)?;
    if !self.q_where.is_empty() {
      write!(f, "WHERE {} ", self.q_where.join(" AND "))?;
    }
    if let Some(order) = &self.q_order {
      write!(
        f,
        "ORDER BY {} {} ",
        order.field,
        match order.order {
          Order::Asc => "ASC",
          Order::Desc => "DESC"
        }
      )?;
    }
    if let Some(lim) = self.limit {
      write!(f, "LIMIT {} ", lim)?;
      // OFFSET without LIMIT is a syntax error in SQLite.
      if let Some(off) = self.offset {
        write!(f, "OFFSET {} ", off)?;
      }
    }
    Ok(())
  }

}
