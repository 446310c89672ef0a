//! MongoDB style query documents.
//!
//! Predicates become filter documents (`{"age": {"$gt": 3}}`), order
//! specifiers a sort document and projected paths a field selection. Keys are
//! dotted property chains below the root variable, with metamodel column
//! overrides applied.

use serde_json::{Map, Value as Json, json};
use tracing::debug;

use crate::{
    error::{Error, Result},
    expr::{Expr, Operation, Order, OrderSpecifier, Path, PathElement},
    metadata::QueryMetadata,
    metamodel::{Metamodel, NoMetamodel},
    operator::Op,
    value::{Value, ValueType},
};

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentQuery {
    pub filter: Json,
    pub sort: Option<Json>,
    pub projection: Option<Json>,
    pub limit: Option<u64>,
    pub skip: Option<u64>,
}

#[derive(Clone, Copy)]
pub struct DocumentSerializer<'a> {
    metamodel: &'a dyn Metamodel,
    escape: char,
}

impl Default for DocumentSerializer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DocumentSerializer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSerializer").finish_non_exhaustive()
    }
}

fn not_a_predicate(expr: &Expr) -> Error {
    Error::NotAPredicate(format!("{expr:?}"))
}

fn regex_quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len());
    for ch in text.chars() {
        if "\\^$.|?*+()[]{}".contains(ch) {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted
}

/// LIKE pattern to an anchored regular expression. A character after
/// `escape` is matched literally.
fn like_to_regex(pattern: &str, escape: char) -> String {
    let mut regex = String::from("^");
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        match ch {
            ch if ch == escape => {
                let literal = chars.next().unwrap_or(escape);
                regex.push_str(&regex_quote(&literal.to_string()));
            }
            '%' => regex.push_str(".*"),
            '_' => regex.push('.'),
            other => regex.push_str(&regex_quote(&other.to_string())),
        }
    }
    regex.push('$');
    regex
}

fn regex(pattern: String, ignore_case: bool) -> Json {
    if ignore_case {
        json!({ "$regex": pattern, "$options": "i" })
    } else {
        json!({ "$regex": pattern })
    }
}

fn single(key: String, value: Json) -> Json {
    let mut doc = Map::new();
    doc.insert(key, value);
    Json::Object(doc)
}

impl<'a> DocumentSerializer<'a> {
    pub fn new() -> Self {
        Self {
            metamodel: &NoMetamodel,
            escape: '\\',
        }
    }

    pub fn with_escape(mut self, escape: char) -> Self {
        self.escape = escape;
        self
    }

    pub fn with_metamodel(mut self, metamodel: &'a dyn Metamodel) -> Self {
        self.metamodel = metamodel;
        self
    }

    /// Dotted key of a path below its root variable.
    pub fn key(&self, path: &Path) -> Result<String> {
        let mut parts = Vec::with_capacity(path.depth());
        let mut current = Some(path);
        while let Some(path) = current {
            match path.element() {
                PathElement::Variable(_) => {}
                PathElement::Property(name) => {
                    let column = path
                        .parent()
                        .and_then(|owner| self.metamodel.property(owner.ty(), name))
                        .and_then(|info| info.column)
                        .unwrap_or_else(|| name.clone());
                    parts.push(column.to_string());
                }
                PathElement::ListValueConstant(index) => parts.push(index.to_string()),
                PathElement::MapValueConstant(key) => match key.as_str() {
                    Some(key) => parts.push(key.to_owned()),
                    None => parts.push(key.to_string()),
                },
                PathElement::CollectionAny => {}
                PathElement::ListValue(_) | PathElement::MapValue(_) => {
                    return Err(not_a_predicate(&Expr::Path(path.clone())));
                }
            }
            current = path.parent();
        }
        parts.reverse();
        Ok(parts.join("."))
    }

    fn path_key(&self, expr: &Expr) -> Result<String> {
        match expr {
            Expr::Path(path) => self.key(path),
            other => Err(not_a_predicate(other)),
        }
    }

    fn value(&self, expr: &Expr) -> Result<Json> {
        match expr {
            Expr::Constant(constant) => Ok(constant.value().to_json()),
            other => Err(not_a_predicate(other)),
        }
    }

    fn string(&self, expr: &Expr) -> Result<String> {
        match expr.as_constant() {
            Some(Value::String(text)) => Ok(text.to_string()),
            _ => Err(not_a_predicate(expr)),
        }
    }

    /// Split `items.any().name` into (`items`, `name`) for `$elemMatch`.
    fn element_match(&self, expr: &Expr) -> Result<Option<(String, Path)>> {
        let Expr::Path(path) = expr else {
            return Ok(None);
        };
        let mut current = Some(path);
        while let Some(step) = current {
            if let PathElement::CollectionAny = step.element() {
                let Some(collection) = step.parent() else {
                    return Ok(None);
                };
                if step == path {
                    return Ok(None);
                }
                let inner = rebase(path, step);
                return Ok(Some((self.key(collection)?, inner)));
            }
            current = step.parent();
        }
        Ok(None)
    }

    pub fn to_filter(&self, predicate: &Expr) -> Result<Json> {
        let Expr::Operation(operation) = predicate else {
            return match predicate {
                Expr::Path(path) if path.ty() == &ValueType::Bool => {
                    Ok(single(self.key(path)?, Json::Bool(true)))
                }
                other => Err(not_a_predicate(other)),
            };
        };
        let op = operation.op().ok_or_else(|| not_a_predicate(predicate))?;
        let args = operation.args();

        if let Some(first) = args.first() {
            if op != Op::And && op != Op::Or && op != Op::Not {
                if let Some((collection, inner)) = self.element_match(first)? {
                    let mut rebased = args.to_vec();
                    rebased[0] = Expr::Path(inner);
                    let rebased = Operation::new(operation.ty().clone(), op, rebased)?;
                    let condition = self.to_filter(&rebased.into())?;
                    return Ok(single(collection, json!({ "$elemMatch": condition })));
                }
            }
        }

        let doc = match (op, args) {
            (Op::And, [lhs, rhs]) => merge_and(self.to_filter(lhs)?, self.to_filter(rhs)?),
            (Op::Or, [lhs, rhs]) => {
                let mut branches = Vec::new();
                for side in [lhs, rhs] {
                    match self.to_filter(side)? {
                        Json::Object(mut doc) if doc.len() == 1 && doc.contains_key("$or") => {
                            if let Some(Json::Array(nested)) = doc.remove("$or") {
                                branches.extend(nested);
                            }
                        }
                        other => branches.push(other),
                    }
                }
                json!({ "$or": branches })
            }
            (Op::Not, [inner]) => self.negate(inner)?,
            (Op::Eq, [Expr::Operation(size), count]) if size.op() == Some(Op::ColSize) => {
                let path = size.arg(0).ok_or_else(|| not_a_predicate(predicate))?;
                single(self.path_key(path)?, json!({ "$size": self.value(count)? }))
            }
            (Op::Eq, [path, value]) => single(self.path_key(path)?, self.value(value)?),
            (Op::Ne, [path, value]) => single(self.path_key(path)?, json!({ "$ne": self.value(value)? })),
            (Op::Lt, [path, value]) => single(self.path_key(path)?, json!({ "$lt": self.value(value)? })),
            (Op::Loe, [path, value]) => single(self.path_key(path)?, json!({ "$lte": self.value(value)? })),
            (Op::Gt, [path, value]) => single(self.path_key(path)?, json!({ "$gt": self.value(value)? })),
            (Op::Goe, [path, value]) => single(self.path_key(path)?, json!({ "$gte": self.value(value)? })),
            (Op::Between, [path, low, high]) => single(
                self.path_key(path)?,
                json!({ "$gte": self.value(low)?, "$lte": self.value(high)? }),
            ),
            (Op::In | Op::NotIn, [path, values]) => {
                let key = self.path_key(path)?;
                let values = match self.value(values)? {
                    Json::Array(items) => items,
                    single => vec![single],
                };
                let operator = if op == Op::In { "$in" } else { "$nin" };
                single(key, single(operator.to_owned(), Json::Array(values)))
            }
            (Op::IsNull, [path]) => single(self.path_key(path)?, json!({ "$exists": false })),
            (Op::IsNotNull, [path]) => single(self.path_key(path)?, json!({ "$exists": true })),
            (Op::EqIgnoreCase, [path, value]) => single(
                self.path_key(path)?,
                regex(format!("^{}$", regex_quote(&self.string(value)?)), true),
            ),
            (Op::StartsWith | Op::StartsWithIc, [path, value]) => single(
                self.path_key(path)?,
                regex(format!("^{}", regex_quote(&self.string(value)?)), op == Op::StartsWithIc),
            ),
            (Op::EndsWith | Op::EndsWithIc, [path, value]) => single(
                self.path_key(path)?,
                regex(format!("{}$", regex_quote(&self.string(value)?)), op == Op::EndsWithIc),
            ),
            (Op::StringContains | Op::StringContainsIc, [path, value]) => single(
                self.path_key(path)?,
                regex(
                    format!(".*{}.*", regex_quote(&self.string(value)?)),
                    op == Op::StringContainsIc,
                ),
            ),
            (Op::Matches | Op::MatchesIc, [path, value]) => single(
                self.path_key(path)?,
                regex(self.string(value)?, op == Op::MatchesIc),
            ),
            (Op::Like, [path, value]) => {
                single(self.path_key(path)?, regex(like_to_regex(&self.string(value)?, self.escape), false))
            }
            (Op::StringIsEmpty, [path]) => single(self.path_key(path)?, json!("")),
            (Op::ColIsEmpty, [path]) => {
                let key = self.path_key(path)?;
                json!({ "$or": [
                    single(key.clone(), json!({ "$exists": false })),
                    single(key, json!({ "$size": 0 })),
                ] })
            }
            (Op::ContainsKey, [path, key]) => {
                let key = match key.as_constant() {
                    Some(Value::String(key)) => key.to_string(),
                    Some(other) => other.to_string(),
                    None => return Err(not_a_predicate(predicate)),
                };
                single(format!("{}.{key}", self.path_key(path)?), json!({ "$exists": true }))
            }
            (Op::ContainsValue | Op::MemberOf, [lhs, rhs]) => {
                // `members contains v` and `v member of members` both test the collection
                let (path, value) = if op == Op::MemberOf { (rhs, lhs) } else { (lhs, rhs) };
                match self.value(value)? {
                    Json::Array(items) => single(self.path_key(path)?, json!({ "$all": items })),
                    single_value => single(self.path_key(path)?, single_value),
                }
            }
            _ => return Err(not_a_predicate(predicate)),
        };
        Ok(doc)
    }

    fn negate(&self, inner: &Expr) -> Result<Json> {
        if let Expr::Operation(operation) = inner {
            match (operation.op(), operation.args()) {
                (Some(Op::Eq), [path @ Expr::Path(_), value]) => {
                    return Ok(single(self.path_key(path)?, json!({ "$ne": self.value(value)? })));
                }
                (Some(Op::Ne), [path @ Expr::Path(_), value]) => {
                    return Ok(single(self.path_key(path)?, self.value(value)?));
                }
                (Some(Op::IsNull), [path]) => {
                    return Ok(single(self.path_key(path)?, json!({ "$exists": true })));
                }
                (Some(Op::IsNotNull), [path]) => {
                    return Ok(single(self.path_key(path)?, json!({ "$exists": false })));
                }
                _ => {}
            }
        }
        Ok(json!({ "$nor": [self.to_filter(inner)?] }))
    }

    /// `{"key": 1}` for ascending and `-1` for descending keys, in order.
    pub fn to_sort(&self, order_by: &[OrderSpecifier]) -> Result<Json> {
        let mut sort = Map::new();
        for order in order_by {
            let direction = match order.order() {
                Order::Asc => 1,
                Order::Desc => -1,
            };
            sort.insert(self.path_key(order.target())?, json!(direction));
        }
        Ok(Json::Object(sort))
    }

    pub fn to_projection(&self, projection: &[Expr]) -> Result<Json> {
        let mut fields = Map::new();
        for expr in projection {
            fields.insert(self.path_key(expr)?, json!(1));
        }
        Ok(Json::Object(fields))
    }

    /// Translate the filter, ordering, projection and limits of a query.
    ///
    /// Joins are ignored; documents are queried one collection at a time.
    pub fn to_query(&self, md: &QueryMetadata) -> Result<DocumentQuery> {
        let filter = match md.filter() {
            Some(filter) => self.to_filter(filter)?,
            None => json!({}),
        };
        let sort = if md.order_by().is_empty() {
            None
        } else {
            Some(self.to_sort(md.order_by())?)
        };
        let root_only = md
            .projection()
            .iter()
            .all(|expr| expr.as_path().is_some_and(Path::is_root));
        let projection = if md.projection().is_empty() || root_only {
            None
        } else {
            Some(self.to_projection(md.projection())?)
        };
        let modifiers = md.modifiers();
        debug!(
            sorted = sort.is_some(),
            projected = projection.is_some(),
            "serialized document query"
        );
        Ok(DocumentQuery {
            filter,
            sort,
            projection,
            limit: modifiers.limit,
            skip: modifiers.offset,
        })
    }
}

/// Path below `base` re-rooted at a variable, keeping the property chain.
fn rebase(path: &Path, base: &Path) -> Path {
    let mut steps = Vec::new();
    let mut current = Some(path);
    while let Some(step) = current {
        if step == base {
            break;
        }
        steps.push(step);
        current = step.parent();
    }
    let mut rebased = Path::variable(base.ty().clone(), "elem");
    for step in steps.into_iter().rev() {
        rebased = match step.element() {
            PathElement::Property(name) => rebased.get(name.clone(), step.ty().clone()),
            PathElement::ListValueConstant(index) => rebased.at(*index, step.ty().clone()),
            PathElement::MapValueConstant(key) => rebased.value_of(key.clone(), step.ty().clone()),
            _ => rebased,
        };
    }
    rebased
}

/// AND two filter documents, merging them when their keys do not collide.
fn merge_and(lhs: Json, rhs: Json) -> Json {
    match (lhs, rhs) {
        (Json::Object(mut left), Json::Object(right)) => {
            let mergeable = right.iter().all(|(key, value)| match left.get(key) {
                None => !key.starts_with('$'),
                Some(existing) => element_matches(existing).is_some() && element_matches(value).is_some(),
            });
            if !mergeable {
                return and_list(Json::Object(left), Json::Object(right));
            }
            for (key, value) in right {
                match left.get_mut(&key) {
                    Some(existing) => {
                        if let (Some(target), Some(extra)) = (element_matches_mut(existing), element_matches(&value)) {
                            for (field, condition) in extra {
                                target.insert(field.clone(), condition.clone());
                            }
                        }
                    }
                    None => {
                        left.insert(key, value);
                    }
                }
            }
            Json::Object(left)
        }
        (lhs, rhs) => and_list(lhs, rhs),
    }
}

fn and_list(lhs: Json, rhs: Json) -> Json {
    let mut branches = Vec::new();
    for side in [lhs, rhs] {
        match side {
            Json::Object(mut doc) if doc.len() == 1 && doc.contains_key("$and") => {
                if let Some(Json::Array(nested)) = doc.remove("$and") {
                    branches.extend(nested);
                }
            }
            other => branches.push(other),
        }
    }
    json!({ "$and": branches })
}

fn element_matches(value: &Json) -> Option<&Map<String, Json>> {
    value.as_object()?.get("$elemMatch")?.as_object()
}

fn element_matches_mut(value: &mut Json) -> Option<&mut Map<String, Json>> {
    value.as_object_mut()?.get_mut("$elemMatch")?.as_object_mut()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::metamodel::MapMetamodel;

    use super::*;

    fn user() -> Path {
        Path::variable(ValueType::entity("User"), "user")
    }

    fn prop(name: &str, ty: ValueType) -> Expr {
        user().get(name, ty).into()
    }

    #[test]
    fn test_comparisons() {
        let serializer = DocumentSerializer::new();
        let age = prop("age", ValueType::I32);
        assert_eq!(json!({ "age": 3 }), serializer.to_filter(&age.eq(3)).unwrap());
        assert_eq!(json!({ "age": { "$gte": 3, "$lte": 7 } }), serializer.to_filter(&age.between(3, 7)).unwrap());
        assert_eq!(json!({ "age": { "$in": [1, 2] } }), serializer.to_filter(&age.is_in(vec![1, 2])).unwrap());
        assert_eq!(json!({ "age": { "$ne": 3 } }), serializer.to_filter(&age.eq(3).not()).unwrap());
        assert_eq!(json!({ "age": { "$exists": false } }), serializer.to_filter(&age.is_null()).unwrap());
    }

    #[test]
    fn test_and_merges_or_lists() {
        let serializer = DocumentSerializer::new();
        let age = prop("age", ValueType::I32);
        let name = prop("firstName", ValueType::String);
        assert_eq!(
            json!({ "age": { "$gt": 3 }, "firstName": "Bob" }),
            serializer.to_filter(&age.gt(3).and(name.eq("Bob"))).unwrap()
        );
        assert_eq!(
            json!({ "$and": [{ "age": { "$gt": 3 } }, { "age": { "$lt": 10 } }] }),
            serializer.to_filter(&age.gt(3).and(age.lt(10))).unwrap()
        );
        assert_eq!(
            json!({ "$or": [{ "age": 1 }, { "age": 2 }, { "firstName": "Bob" }] }),
            serializer
                .to_filter(&age.eq(1).or(age.eq(2)).or(name.eq("Bob")))
                .unwrap()
        );
        assert_eq!(
            json!({ "$nor": [{ "age": { "$gt": 3 } }] }),
            serializer.to_filter(&age.gt(3).not()).unwrap()
        );
    }

    #[test]
    fn test_string_predicates() {
        let serializer = DocumentSerializer::new();
        let name = prop("firstName", ValueType::String);
        assert_eq!(
            json!({ "firstName": { "$regex": "^Bo\\.b" } }),
            serializer.to_filter(&name.starts_with("Bo.b")).unwrap()
        );
        assert_eq!(
            json!({ "firstName": { "$regex": ".*ob.*", "$options": "i" } }),
            serializer.to_filter(&name.contains_ignore_case("ob")).unwrap()
        );
        assert_eq!(
            json!({ "firstName": { "$regex": "^B.b.*$" } }),
            serializer.to_filter(&name.like("B_b%")).unwrap()
        );
    }

    #[test]
    fn test_like_escape_is_literal() {
        let name = prop("firstName", ValueType::String);
        assert_eq!(
            json!({ "firstName": { "$regex": "^50%a_.*$" } }),
            DocumentSerializer::new().to_filter(&name.like("50\\%a\\_%")).unwrap()
        );
        assert_eq!(
            json!({ "firstName": { "$regex": "^50%.$" } }),
            DocumentSerializer::new()
                .with_escape('!')
                .to_filter(&name.like("50!%_"))
                .unwrap()
        );
    }

    #[test]
    fn test_sort_keeps_order_by_sequence() {
        let serializer = DocumentSerializer::new();
        let name = prop("name", ValueType::String);
        let age = prop("age", ValueType::I32);
        let sort = serializer.to_sort(&[name.asc(), age.desc()]).unwrap();
        assert_eq!(r#"{"name":1,"age":-1}"#, sort.to_string());
    }

    #[test]
    fn test_collections() {
        let serializer = DocumentSerializer::new();
        let tags = user().get("tags", ValueType::collection_of(ValueType::String));
        let tags_expr: Expr = tags.clone().into();
        assert_eq!(
            json!({ "tags": { "$size": 2 } }),
            serializer.to_filter(&tags_expr.size().eq(2)).unwrap()
        );
        assert_eq!(
            json!({ "tags": { "$all": ["a", "b"] } }),
            serializer.to_filter(&tags_expr.contains_value(vec!["a", "b"])).unwrap()
        );

        let items = user().get("items", ValueType::collection_of(ValueType::entity("Item")));
        let any = items.any();
        let name: Expr = any.get("name", ValueType::String).into();
        let qty: Expr = any.get("qty", ValueType::I32).into();
        assert_eq!(
            json!({ "items": { "$elemMatch": { "name": "pen", "qty": { "$gt": 2 } } } }),
            serializer.to_filter(&name.eq("pen").and(qty.gt(2))).unwrap()
        );
    }

    #[test]
    fn test_keys_use_metamodel_columns() {
        let metamodel = MapMetamodel::new().column("User", "firstName", "first_name");
        let serializer = DocumentSerializer::new().with_metamodel(&metamodel);
        let address = user().get("address", ValueType::entity("Address"));
        let street = address.get("street", ValueType::String);
        assert_eq!("address.street", serializer.key(&street).unwrap());

        let mut md = QueryMetadata::new();
        let name = prop("firstName", ValueType::String);
        md.from(user())
            .add_where(name.eq("Bob"))
            .add_order_by(name.desc())
            .add_projection(name.clone())
            .set_limit(5);
        let query = serializer.to_query(&md).unwrap();
        assert_eq!(json!({ "first_name": "Bob" }), query.filter);
        assert_eq!(Some(json!({ "first_name": -1 })), query.sort);
        assert_eq!(Some(json!({ "first_name": 1 })), query.projection);
        assert_eq!(Some(5), query.limit);
    }

    #[test]
    fn test_not_a_predicate() {
        let serializer = DocumentSerializer::new();
        let age = prop("age", ValueType::I32);
        assert!(matches!(serializer.to_filter(&age.add(1)), Err(Error::NotAPredicate(_))));
        assert!(matches!(serializer.to_filter(&age.year().eq(1)), Err(Error::NotAPredicate(_))));
    }
}
