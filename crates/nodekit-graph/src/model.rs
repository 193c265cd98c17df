//! Model schemas: predefined labels, mass-assignable fields, and attribute
//! casts layered over schema-less entities.

use indexmap::IndexMap;
use nodekit_core::{Attributes, Cast, Value};

use crate::builder::NodeQuery;
use crate::entity::{Entity, IDENTITY_KEY};
use crate::error::Result;
use crate::gateway::StoreGateway;

/// Describes one kind of node.
///
/// ```
/// use nodekit_core::Cast;
/// use nodekit_graph::ModelSchema;
///
/// let user = ModelSchema::new(["User"])
///     .fillable(["name", "email", "age"])
///     .cast("age", Cast::Integer);
/// assert!(user.is_fillable("email"));
/// assert!(!user.is_fillable("is_admin"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ModelSchema {
    labels: Vec<String>,
    fillable: Vec<String>,
    casts: IndexMap<String, Cast>,
}

impl ModelSchema {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Fields accepted by [`fill`](Self::fill). An empty list accepts all.
    pub fn fillable<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fillable = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn cast(mut self, field: impl Into<String>, cast: Cast) -> Self {
        self.casts.insert(field.into(), cast);
        self
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn is_fillable(&self, field: &str) -> bool {
        self.fillable.is_empty() || self.fillable.iter().any(|f| f == field)
    }

    /// Apply the cast registered for `field`, if any.
    pub fn cast_value(&self, field: &str, value: Value) -> Result<Value> {
        match self.casts.get(field) {
            Some(cast) => Ok(cast.apply(&value)?),
            None => Ok(value),
        }
    }

    /// Set one attribute on `entity`, casting it first.
    pub fn assign(&self, entity: &mut Entity, field: &str, value: impl Into<Value>) -> Result<()> {
        let value = self.cast_value(field, value.into())?;
        entity.set(field, value);
        Ok(())
    }

    /// Assign every fillable attribute; others are skipped silently. The
    /// identity is always accepted.
    pub fn fill(&self, entity: &mut Entity, attributes: Attributes) -> Result<()> {
        for (field, value) in attributes {
            if field == IDENTITY_KEY || self.is_fillable(&field) {
                self.assign(entity, &field, value)?;
            }
        }
        Ok(())
    }

    /// An unsaved entity with this model's labels and filled attributes.
    pub fn instantiate(&self, attributes: Attributes) -> Result<Entity> {
        let mut entity = Entity::new(self.labels.iter().cloned(), Attributes::new());
        self.fill(&mut entity, attributes)?;
        Ok(entity)
    }

    /// Instantiate and save.
    pub async fn create<G>(&self, attributes: Attributes, gateway: &G) -> Result<Entity>
    where
        G: StoreGateway + ?Sized,
    {
        let mut entity = self.instantiate(attributes)?;
        entity.save(gateway).await?;
        Ok(entity)
    }

    /// A query over this model's labels.
    pub fn query(&self) -> NodeQuery {
        NodeQuery::label(self.labels.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;
    use crate::testing::{node_record, RecordingGateway};
    use nodekit_core::{attrs, CoreError};

    fn user_schema() -> ModelSchema {
        ModelSchema::new(["User"])
            .fillable(["name", "age", "joined"])
            .cast("age", Cast::Integer)
            .cast("joined", Cast::DateTime)
    }

    #[test]
    fn test_fill_skips_guarded_fields_and_casts() {
        let entity = user_schema()
            .instantiate(attrs! {
                "name" => "Dana",
                "age" => "41",
                "is_admin" => true,
                "joined" => "2023-05-01"
            })
            .unwrap();

        assert_eq!(entity.labels(), ["User"]);
        assert_eq!(entity.get("age"), Some(&Value::Integer(41)));
        assert_eq!(
            entity.get("joined"),
            Some(&Value::from("2023-05-01T00:00:00+00:00"))
        );
        assert!(entity.get("is_admin").is_none());
    }

    #[test]
    fn test_assign_casts_later_updates() {
        let schema = user_schema();
        let mut entity = schema.instantiate(attrs! {}).unwrap();
        schema.assign(&mut entity, "age", 3.7).unwrap();
        assert_eq!(entity.get("age"), Some(&Value::Integer(3)));

        let err = schema.assign(&mut entity, "age", "old").unwrap_err();
        assert!(matches!(err, GraphError::Core(CoreError::Cast { .. })));
    }

    #[test]
    fn test_empty_fillable_accepts_everything() {
        let schema = ModelSchema::new(["Anything"]);
        let entity = schema.instantiate(attrs! { "x" => 1, "id" => "a-1" }).unwrap();
        assert_eq!(entity.get("x"), Some(&Value::Integer(1)));
        assert_eq!(entity.identity(), Some("a-1"));
    }

    #[tokio::test]
    async fn test_create_and_query_use_model_labels() {
        let gateway = RecordingGateway::new();
        gateway.push(vec![node_record("n", &["User"], attrs! {})]);

        let user = user_schema()
            .create(attrs! { "name" => "Eve" }, &gateway)
            .await
            .unwrap();
        assert!(user.is_persisted());

        let stmt = user_schema().query().where_eq("name", "Eve").compile_select().unwrap();
        assert_eq!(stmt.text, "MATCH (n:User) WHERE n.name = $p1 RETURN n");
    }
}
