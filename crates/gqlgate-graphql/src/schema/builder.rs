//! Composed schema builder.
//!
//! [`SchemaBuilder`] accumulates the fragments of every registered service
//! under first-write-wins keys and compiles them into an executable
//! [`ComposedSchema`] with async-graphql's dynamic schema API.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use async_graphql::dynamic::{
    Field, FieldFuture, FieldValue, InputValue, Interface, InterfaceField, Object, Schema, TypeRef,
};
use async_graphql::{Request, Response, Value};
use indexmap::IndexMap;
use tracing::{debug, trace, warn};

use super::definition::{
    FieldCoordinate, FieldDef, InterfaceTypeDef, MUTATION_TYPE, ObjectTypeDef, QUERY_TYPE,
    SchemaFragment, TypeResolver,
};
use super::types::{OutputType, ScalarType};
use crate::error::GatewayError;
use crate::resolvers::{PropertyResolver, Resolver};

/// Field added to every object type that has no mappable fields.
pub const PLACEHOLDER_FIELD: &str = "_placeholder";

/// Field always present on the `Query` root.
pub const HEALTH_FIELD: &str = "_health";

/// Type names owned by the engine or by the composed roots.
pub const RESERVED_TYPE_NAMES: &[&str] = &[
    QUERY_TYPE,
    MUTATION_TYPE,
    "Subscription",
    "String",
    "Int",
    "Float",
    "Boolean",
    "ID",
];

/// Configuration for schema compilation.
#[derive(Debug, Clone)]
pub struct SchemaBuilderConfig {
    /// Maximum query depth allowed.
    pub max_depth: usize,

    /// Maximum query complexity allowed.
    pub max_complexity: usize,

    /// Whether to enable introspection queries.
    pub introspection_enabled: bool,
}

impl Default for SchemaBuilderConfig {
    fn default() -> Self {
        Self {
            max_depth: 15,
            max_complexity: 500,
            introspection_enabled: true,
        }
    }
}

/// Kind of definition a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    ObjectType,
    InterfaceType,
    QueryField,
    MutationField,
    Resolver,
    TypeResolver,
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ObjectType => "object type",
            Self::InterfaceType => "interface type",
            Self::QueryField => "query field",
            Self::MutationField => "mutation field",
            Self::Resolver => "resolver",
            Self::TypeResolver => "type resolver",
        })
    }
}

/// A definition refused because its key was already taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub kind: DefinitionKind,
    pub key: String,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "The {} '{}' has already been defined, its definition will be ignored",
            self.kind, self.key
        )
    }
}

/// Result of adding one definition.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum AddOutcome {
    Applied,
    Rejected(Rejection),
}

impl AddOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    pub fn into_rejection(self) -> Option<Rejection> {
        match self {
            Self::Applied => None,
            Self::Rejected(rejection) => Some(rejection),
        }
    }
}

fn reject(kind: DefinitionKind, key: impl fmt::Display) -> AddOutcome {
    let rejection = Rejection {
        kind,
        key: key.to_string(),
    };
    warn!(kind = %kind, key = %rejection.key, "{rejection}");
    AddOutcome::Rejected(rejection)
}

fn insert_first<K, V>(
    map: &mut IndexMap<K, V>,
    key: K,
    value: V,
    kind: DefinitionKind,
) -> AddOutcome
where
    K: std::hash::Hash + Eq + fmt::Display,
{
    if map.contains_key(&key) {
        return reject(kind, key);
    }
    map.insert(key, value);
    AddOutcome::Applied
}

fn is_reserved_type(name: &str) -> bool {
    RESERVED_TYPE_NAMES.contains(&name)
}

fn collect_rejections(outcomes: impl IntoIterator<Item = AddOutcome>) -> Vec<Rejection> {
    outcomes
        .into_iter()
        .filter_map(AddOutcome::into_rejection)
        .collect()
}

/// Accumulated, not yet compiled schema state.
///
/// Every key is first-write-wins: object and interface types by name, root
/// fields by name, resolvers by coordinate and type resolvers by interface
/// name. Later definitions under a used key are rejected, as are
/// definitions of [`RESERVED_TYPE_NAMES`] and of the `_health` root field.
#[derive(Default, Clone)]
pub struct SchemaBuilder {
    object_types: IndexMap<String, ObjectTypeDef>,
    interface_types: IndexMap<String, InterfaceTypeDef>,
    query_fields: IndexMap<String, FieldDef>,
    mutation_fields: IndexMap<String, FieldDef>,
    resolvers: IndexMap<FieldCoordinate, Resolver>,
    type_resolvers: IndexMap<String, TypeResolver>,
}

impl fmt::Debug for SchemaBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaBuilder")
            .field("object_types", &self.object_types.keys().collect::<Vec<_>>())
            .field("interface_types", &self.interface_types.keys().collect::<Vec<_>>())
            .field("query_fields", &self.query_fields.keys().collect::<Vec<_>>())
            .field("mutation_fields", &self.mutation_fields.keys().collect::<Vec<_>>())
            .field("resolvers", &self.resolvers.keys().collect::<Vec<_>>())
            .field("type_resolvers", &self.type_resolvers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_object_type(&mut self, object: ObjectTypeDef) -> AddOutcome {
        if is_reserved_type(&object.name) || self.interface_types.contains_key(&object.name) {
            return reject(DefinitionKind::ObjectType, &object.name);
        }
        insert_first(
            &mut self.object_types,
            object.name.clone(),
            object,
            DefinitionKind::ObjectType,
        )
    }

    pub fn add_object_types(
        &mut self,
        objects: impl IntoIterator<Item = ObjectTypeDef>,
    ) -> Vec<Rejection> {
        collect_rejections(
            objects
                .into_iter()
                .map(|o| self.add_object_type(o))
                .collect::<Vec<_>>(),
        )
    }

    pub fn add_interface_type(&mut self, interface: InterfaceTypeDef) -> AddOutcome {
        if is_reserved_type(&interface.name) || self.object_types.contains_key(&interface.name) {
            return reject(DefinitionKind::InterfaceType, &interface.name);
        }
        insert_first(
            &mut self.interface_types,
            interface.name.clone(),
            interface,
            DefinitionKind::InterfaceType,
        )
    }

    pub fn add_interface_types(
        &mut self,
        interfaces: impl IntoIterator<Item = InterfaceTypeDef>,
    ) -> Vec<Rejection> {
        collect_rejections(
            interfaces
                .into_iter()
                .map(|i| self.add_interface_type(i))
                .collect::<Vec<_>>(),
        )
    }

    pub fn add_query_field(&mut self, field: FieldDef) -> AddOutcome {
        if field.name == HEALTH_FIELD {
            return reject(DefinitionKind::QueryField, HEALTH_FIELD);
        }
        insert_first(
            &mut self.query_fields,
            field.name.clone(),
            field,
            DefinitionKind::QueryField,
        )
    }

    pub fn add_query_fields(&mut self, fields: impl IntoIterator<Item = FieldDef>) -> Vec<Rejection> {
        collect_rejections(
            fields
                .into_iter()
                .map(|f| self.add_query_field(f))
                .collect::<Vec<_>>(),
        )
    }

    pub fn add_mutation_field(&mut self, field: FieldDef) -> AddOutcome {
        insert_first(
            &mut self.mutation_fields,
            field.name.clone(),
            field,
            DefinitionKind::MutationField,
        )
    }

    pub fn add_mutation_fields(
        &mut self,
        fields: impl IntoIterator<Item = FieldDef>,
    ) -> Vec<Rejection> {
        collect_rejections(
            fields
                .into_iter()
                .map(|f| self.add_mutation_field(f))
                .collect::<Vec<_>>(),
        )
    }

    pub fn add_resolver(&mut self, coordinate: FieldCoordinate, resolver: Resolver) -> AddOutcome {
        insert_first(&mut self.resolvers, coordinate, resolver, DefinitionKind::Resolver)
    }

    pub fn add_resolvers(
        &mut self,
        resolvers: impl IntoIterator<Item = (FieldCoordinate, Resolver)>,
    ) -> Vec<Rejection> {
        collect_rejections(
            resolvers
                .into_iter()
                .map(|(c, r)| self.add_resolver(c, r))
                .collect::<Vec<_>>(),
        )
    }

    pub fn add_type_resolver(
        &mut self,
        interface: impl Into<String>,
        resolver: TypeResolver,
    ) -> AddOutcome {
        insert_first(
            &mut self.type_resolvers,
            interface.into(),
            resolver,
            DefinitionKind::TypeResolver,
        )
    }

    pub fn add_type_resolvers(
        &mut self,
        resolvers: impl IntoIterator<Item = (String, TypeResolver)>,
    ) -> Vec<Rejection> {
        collect_rejections(
            resolvers
                .into_iter()
                .map(|(i, r)| self.add_type_resolver(i, r))
                .collect::<Vec<_>>(),
        )
    }

    /// Adds every definition of a service fragment.
    pub fn add_fragment(&mut self, fragment: SchemaFragment) -> Vec<Rejection> {
        let mut rejections = self.add_object_types(fragment.object_types);
        rejections.extend(self.add_query_fields(fragment.query_fields));
        rejections.extend(self.add_resolvers(fragment.resolvers));
        rejections
    }

    /// Compiles the accumulated definitions into an executable schema.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SchemaBuildFailed`] if the engine rejects the
    /// schema, for example because a field references an undefined type.
    pub fn compile(&self, config: &SchemaBuilderConfig) -> Result<ComposedSchema, GatewayError> {
        debug!(
            object_types = self.object_types.len(),
            interface_types = self.interface_types.len(),
            query_fields = self.query_fields.len(),
            "Compiling composed schema"
        );

        let typing = Arc::new(ValueTyping {
            interfaces: self.interface_types.keys().cloned().collect(),
            type_resolvers: self.type_resolvers.clone(),
        });

        let mut schema_builder = Schema::build(QUERY_TYPE, None, None);

        for interface in self.interface_types.values() {
            schema_builder = schema_builder.register(build_interface(interface));
        }

        for object in self.object_types.values() {
            let mut gql_object = Object::new(object.name.as_str());
            if let Some(description) = &object.description {
                gql_object = gql_object.description(description.as_str());
            }
            for interface in &object.interfaces {
                gql_object = gql_object.implement(interface.as_str());
            }
            if object.fields.is_empty() {
                trace!(object = %object.name, "Adding placeholder field to empty object type");
                gql_object = gql_object.field(placeholder_field());
            }
            for field in &object.fields {
                gql_object = gql_object.field(self.build_field(&object.name, field, &typing));
            }
            schema_builder = schema_builder.register(gql_object);
        }

        let mut query = Object::new(QUERY_TYPE).field(Field::new(
            HEALTH_FIELD,
            TypeRef::named_nn(TypeRef::STRING),
            |_| FieldFuture::new(async { Ok(Some(Value::String("ok".to_string()))) }),
        ));
        for field in self.query_fields.values() {
            query = query.field(self.build_field(QUERY_TYPE, field, &typing));
        }
        schema_builder = schema_builder.register(query);

        // Mutations are assembled for completeness but the root is never
        // attached to the schema.
        let mut mutation = Object::new(MUTATION_TYPE);
        for field in self.mutation_fields.values() {
            mutation = mutation.field(self.build_field(MUTATION_TYPE, field, &typing));
        }
        debug!(
            mutation_fields = self.mutation_fields.len(),
            "Mutation root built but not attached"
        );
        drop(mutation);

        let mut schema_builder = schema_builder.limit_depth(config.max_depth);
        schema_builder = schema_builder.limit_complexity(config.max_complexity);
        if !config.introspection_enabled {
            schema_builder = schema_builder.disable_introspection();
        }

        let schema = schema_builder
            .finish()
            .map_err(|e| GatewayError::SchemaBuildFailed(e.to_string()))?;

        debug!("Composed schema compiled");
        Ok(ComposedSchema {
            schema,
            service_names: Vec::new(),
            object_types: self.object_types.keys().cloned().collect(),
            query_fields: self.query_fields.keys().cloned().collect(),
        })
    }

    /// Builds an engine field bound to its registered resolver, or to a
    /// parent-key lookup when none is registered.
    fn build_field(&self, type_name: &str, def: &FieldDef, typing: &Arc<ValueTyping>) -> Field {
        let coordinate = FieldCoordinate::new(type_name, def.name.as_str());
        let resolver: Resolver = match self.resolvers.get(&coordinate) {
            Some(resolver) => resolver.clone(),
            None => Arc::new(PropertyResolver::new(def.source_key.as_str())),
        };
        let output = Arc::new(def.ty.clone());
        let typing = typing.clone();

        let mut field = Field::new(def.name.as_str(), def.ty.to_type_ref(), move |ctx| {
            let resolver = resolver.clone();
            let output = output.clone();
            let typing = typing.clone();
            FieldFuture::new(async move {
                let field_ctx = ctx.ctx;
                let resolved = match resolver.resolve(ctx).await {
                    Ok(Some(value)) => typing.field_value(&output, value).map(Some),
                    Ok(None) => Ok(None),
                    Err(err) => Err(err),
                };
                match resolved {
                    Ok(value) => Ok(value),
                    Err(err) => {
                        // Recorded against this field's path; the field itself resolves to null.
                        let error = err.into_server_error(field_ctx.item.pos);
                        field_ctx.add_error(field_ctx.set_error_path(error));
                        Ok(None)
                    }
                }
            })
        });

        for argument in &def.arguments {
            field = field.argument(InputValue::new(
                argument.name.as_str(),
                TypeRef::named(argument.ty.type_name()),
            ));
        }
        if let Some(description) = &def.description {
            field = field.description(description.as_str());
        }
        field
    }
}

fn build_interface(def: &InterfaceTypeDef) -> Interface {
    let mut interface = Interface::new(def.name.as_str());
    if let Some(description) = &def.description {
        interface = interface.description(description.as_str());
    }
    for field in &def.fields {
        let mut gql_field = InterfaceField::new(field.name.as_str(), field.ty.to_type_ref());
        for argument in &field.arguments {
            gql_field = gql_field.argument(InputValue::new(
                argument.name.as_str(),
                TypeRef::named(argument.ty.type_name()),
            ));
        }
        interface = interface.field(gql_field);
    }
    interface
}

fn placeholder_field() -> Field {
    Field::new(PLACEHOLDER_FIELD, TypeRef::named(TypeRef::STRING), |_| {
        FieldFuture::new(async { Ok(None::<Value>) })
    })
}

/// Shapes resolved values to their declared output type.
struct ValueTyping {
    interfaces: HashSet<String>,
    type_resolvers: IndexMap<String, TypeResolver>,
}

impl ValueTyping {
    fn field_value<'a>(
        &self,
        output: &OutputType,
        value: Value,
    ) -> async_graphql::Result<FieldValue<'a>> {
        match (output, value) {
            (_, Value::Null) => Ok(FieldValue::value(Value::Null)),
            (OutputType::List(inner), Value::List(items)) => {
                let items = items
                    .into_iter()
                    .map(|item| self.field_value(inner, item))
                    .collect::<async_graphql::Result<Vec<_>>>()?;
                Ok(FieldValue::list(items))
            }
            (OutputType::Scalar(ScalarType::Id), Value::Number(n)) => {
                Ok(FieldValue::value(Value::String(n.to_string())))
            }
            (OutputType::Named(name), value) if self.interfaces.contains(name) => {
                let concrete = self
                    .type_resolvers
                    .get(name)
                    .and_then(|resolve| resolve(&value))
                    .ok_or_else(|| {
                        async_graphql::Error::new(format!(
                            "Cannot determine the concrete type of interface '{name}'"
                        ))
                    })?;
                Ok(FieldValue::value(value).with_type(concrete))
            }
            (_, value) => Ok(FieldValue::value(value)),
        }
    }
}

/// An executable composed schema and the names it exposes.
///
/// Never mutated after compilation; the registry swaps in a new one on
/// every change.
#[derive(Clone)]
pub struct ComposedSchema {
    schema: Schema,
    service_names: Vec<String>,
    object_types: Vec<String>,
    query_fields: Vec<String>,
}

impl fmt::Debug for ComposedSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposedSchema")
            .field("service_names", &self.service_names)
            .field("object_types", &self.object_types)
            .field("query_fields", &self.query_fields)
            .finish_non_exhaustive()
    }
}

impl ComposedSchema {
    pub(crate) fn with_service_names(mut self, names: Vec<String>) -> Self {
        self.service_names = names;
        self
    }

    /// Services whose descriptions built this schema, in registration order.
    pub fn service_names(&self) -> &[String] {
        &self.service_names
    }

    /// Query fields contributed by services; `_health` is not listed.
    pub fn query_field_names(&self) -> &[String] {
        &self.query_fields
    }

    pub fn has_object_type(&self, name: &str) -> bool {
        self.object_types.iter().any(|t| t == name)
    }

    pub fn has_query_field(&self, name: &str) -> bool {
        self.query_fields.iter().any(|f| f == name)
    }

    /// Schema definition language of the composed schema.
    pub fn sdl(&self) -> String {
        self.schema.sdl()
    }

    /// Executes a request against this schema.
    pub async fn execute(&self, request: impl Into<Request>) -> Response {
        let request: Request = request.into();
        self.schema.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolvers::FieldResolver;
    use crate::schema::definition::ArgumentDef;
    use async_graphql::ErrorExtensions;
    use async_graphql::dynamic::ResolverContext;
    use async_trait::async_trait;

    /// Resolver answering with a fixed value.
    struct Fixed(serde_json::Value);

    #[async_trait]
    impl FieldResolver for Fixed {
        async fn resolve(&self, _ctx: ResolverContext<'_>) -> async_graphql::Result<Option<Value>> {
            Ok(Some(crate::resolvers::json_to_graphql_value(self.0.clone())))
        }
    }

    /// Resolver that always fails with a coded error.
    struct Failing;

    #[async_trait]
    impl FieldResolver for Failing {
        async fn resolve(&self, _ctx: ResolverContext<'_>) -> async_graphql::Result<Option<Value>> {
            Err(async_graphql::Error::new("service unavailable")
                .extend_with(|_, e| e.set("code", "DOWNSTREAM_ERROR")))
        }
    }

    fn string_field(name: &str) -> FieldDef {
        FieldDef::new(name, OutputType::Scalar(ScalarType::String))
    }

    fn book_type() -> ObjectTypeDef {
        ObjectTypeDef::new("Book")
            .with_field(FieldDef::new("id", OutputType::Scalar(ScalarType::Id)))
            .with_field(string_field("title"))
    }

    #[test]
    fn test_first_write_wins() {
        let mut builder = SchemaBuilder::new();
        assert!(builder.add_object_type(book_type()).is_applied());

        let outcome = builder.add_object_type(ObjectTypeDef::new("Book"));
        assert_eq!(
            outcome,
            AddOutcome::Rejected(Rejection {
                kind: DefinitionKind::ObjectType,
                key: "Book".into()
            })
        );
        assert_eq!(builder.object_types["Book"].fields.len(), 2);

        assert!(builder.add_query_field(string_field("books")).is_applied());
        assert!(!builder.add_query_field(string_field("books")).is_applied());
        // Keys are per kind.
        assert!(builder.add_mutation_field(string_field("books")).is_applied());
    }

    #[test]
    fn test_rejection_message() {
        let rejection = Rejection {
            kind: DefinitionKind::ObjectType,
            key: "Book".into(),
        };
        assert_eq!(
            rejection.to_string(),
            "The object type 'Book' has already been defined, its definition will be ignored"
        );
    }

    #[test]
    fn test_add_fragment_collects_rejections() {
        let fixed: Resolver = Arc::new(Fixed(serde_json::json!("x")));
        let fragment = SchemaFragment {
            object_types: vec![book_type()],
            query_fields: vec![string_field("greeting")],
            resolvers: [(FieldCoordinate::query("greeting"), fixed)].into_iter().collect(),
        };

        let mut builder = SchemaBuilder::new();
        assert!(builder.add_fragment(fragment.clone()).is_empty());

        let rejections = builder.add_fragment(fragment);
        let kinds: Vec<_> = rejections.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DefinitionKind::ObjectType,
                DefinitionKind::QueryField,
                DefinitionKind::Resolver
            ]
        );
        assert_eq!(rejections[2].key, "Query.greeting");
    }

    #[tokio::test]
    async fn test_compile_empty_schema() {
        let composed = SchemaBuilder::new()
            .compile(&SchemaBuilderConfig::default())
            .unwrap();
        assert!(composed.query_field_names().is_empty());

        let response = composed.execute("{ _health }").await;
        assert!(response.errors.is_empty());
        assert_eq!(
            response.data.into_json().unwrap(),
            serde_json::json!({ "_health": "ok" })
        );
    }

    #[tokio::test]
    async fn test_compile_binds_resolvers_and_property_lookup() {
        let mut builder = SchemaBuilder::new();
        let _ = builder.add_object_type(
            book_type().with_field(
                FieldDef::new("first_name", OutputType::Scalar(ScalarType::String))
                    .with_source_key("first-name"),
            ),
        );
        let _ = builder.add_query_field(
            FieldDef::new("book", OutputType::Named("Book".into()))
                .with_argument(ArgumentDef::new("id", ScalarType::Id)),
        );
        let _ = builder.add_resolver(
            FieldCoordinate::query("book"),
            Arc::new(Fixed(serde_json::json!({
                "id": 7,
                "title": "Dune",
                "first-name": "Frank"
            }))),
        );

        let composed = builder.compile(&SchemaBuilderConfig::default()).unwrap();
        assert!(composed.has_query_field("book"));
        assert!(composed.has_object_type("Book"));

        let response = composed
            .execute(r#"{ book(id: "7") { id title first_name } }"#)
            .await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        assert_eq!(
            response.data.into_json().unwrap(),
            serde_json::json!({ "book": { "id": "7", "title": "Dune", "first_name": "Frank" } })
        );
    }

    #[tokio::test]
    async fn test_compile_adds_placeholder_to_empty_types() {
        let mut builder = SchemaBuilder::new();
        let _ = builder.add_object_type(ObjectTypeDef::new("Empty"));
        let composed = builder.compile(&SchemaBuilderConfig::default()).unwrap();
        assert!(composed.sdl().contains(PLACEHOLDER_FIELD));
    }

    #[test]
    fn test_compile_fails_on_unknown_reference() {
        let mut builder = SchemaBuilder::new();
        let _ = builder.add_query_field(FieldDef::new("author", OutputType::Named("Author".into())));
        let err = builder.compile(&SchemaBuilderConfig::default()).unwrap_err();
        assert!(matches!(err, GatewayError::SchemaBuildFailed(_)));
    }

    #[test]
    fn test_mutation_root_not_attached() {
        let mut builder = SchemaBuilder::new();
        let _ = builder.add_mutation_field(string_field("createBook"));
        let composed = builder.compile(&SchemaBuilderConfig::default()).unwrap();
        assert!(!composed.sdl().contains("createBook"));
    }

    #[tokio::test]
    async fn test_type_resolver_selects_concrete_type() {
        let mut builder = SchemaBuilder::new();
        let _ = builder.add_interface_type(
            InterfaceTypeDef::new("Item").with_field(string_field("title")),
        );
        let _ = builder.add_object_type(
            ObjectTypeDef::new("Novel")
                .implement("Item")
                .with_field(string_field("title")),
        );
        let _ = builder.add_object_type(
            ObjectTypeDef::new("Magazine")
                .implement("Item")
                .with_field(string_field("title"))
                .with_field(string_field("issue")),
        );
        let _ = builder.add_type_resolver(
            "Item",
            Arc::new(|value: &Value| match value {
                Value::Object(object) if object.contains_key("issue") => {
                    Some("Magazine".to_string())
                }
                _ => Some("Novel".to_string()),
            }),
        );
        let _ = builder.add_query_field(FieldDef::new(
            "items",
            OutputType::List(Box::new(OutputType::Named("Item".into()))),
        ));
        let _ = builder.add_resolver(
            FieldCoordinate::query("items"),
            Arc::new(Fixed(serde_json::json!([
                { "title": "Dune" },
                { "title": "Wired", "issue": "42" }
            ]))),
        );

        let composed = builder.compile(&SchemaBuilderConfig::default()).unwrap();
        let response = composed
            .execute("{ items { __typename title ... on Magazine { issue } } }")
            .await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        assert_eq!(
            response.data.into_json().unwrap(),
            serde_json::json!({ "items": [
                { "__typename": "Novel", "title": "Dune" },
                { "__typename": "Magazine", "title": "Wired", "issue": "42" }
            ]})
        );
    }

    #[tokio::test]
    async fn test_introspection_switch() {
        let config = SchemaBuilderConfig {
            introspection_enabled: false,
            ..Default::default()
        };
        let composed = SchemaBuilder::new().compile(&config).unwrap();
        let response = composed.execute("{ __schema { queryType { name } } }").await;
        let body = serde_json::to_value(&response).unwrap();
        assert!(body["data"]["__schema"].is_null());
    }

    #[tokio::test]
    async fn test_failed_resolver_is_null_with_error_path() {
        let mut builder = SchemaBuilder::new();
        let _ = builder.add_query_field(string_field("broken"));
        let _ = builder.add_query_field(string_field("alsoBroken"));
        let _ = builder.add_query_field(string_field("greeting"));
        let _ = builder.add_resolver(FieldCoordinate::query("broken"), Arc::new(Failing));
        let _ = builder.add_resolver(FieldCoordinate::query("alsoBroken"), Arc::new(Failing));
        let _ = builder.add_resolver(
            FieldCoordinate::query("greeting"),
            Arc::new(Fixed(serde_json::json!("hello"))),
        );

        let composed = builder.compile(&SchemaBuilderConfig::default()).unwrap();
        let response = composed.execute("{ broken alsoBroken greeting }").await;
        let body = serde_json::to_value(&response).unwrap();

        assert_eq!(
            body["data"],
            serde_json::json!({ "broken": null, "alsoBroken": null, "greeting": "hello" })
        );
        let mut paths: Vec<_> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["path"].clone())
            .collect();
        paths.sort_by_key(|p| p.to_string());
        assert_eq!(
            paths,
            vec![serde_json::json!(["alsoBroken"]), serde_json::json!(["broken"])]
        );
        assert_eq!(body["errors"][0]["extensions"]["code"], "DOWNSTREAM_ERROR");
    }

    #[test]
    fn test_reserved_names_are_rejected() {
        let mut builder = SchemaBuilder::new();
        for name in ["Query", "Mutation", "String", "Int", "ID"] {
            let outcome = builder.add_object_type(ObjectTypeDef::new(name));
            assert_eq!(
                outcome,
                AddOutcome::Rejected(Rejection {
                    kind: DefinitionKind::ObjectType,
                    key: name.into()
                })
            );
        }
        assert!(!builder.add_interface_type(InterfaceTypeDef::new("Boolean")).is_applied());
        assert!(!builder.add_query_field(string_field(HEALTH_FIELD)).is_applied());

        // Object and interface types share one namespace.
        assert!(builder.add_object_type(book_type()).is_applied());
        assert!(!builder.add_interface_type(InterfaceTypeDef::new("Book")).is_applied());
    }

    #[tokio::test]
    async fn test_reserved_model_name_keeps_query_root() {
        let mut builder = SchemaBuilder::new();
        let rejections = builder.add_fragment(SchemaFragment {
            object_types: vec![
                ObjectTypeDef::new("Query").with_field(string_field("term")),
                ObjectTypeDef::new("String").with_field(string_field("value")),
            ],
            query_fields: vec![string_field("search")],
            resolvers: [(
                FieldCoordinate::query("search"),
                Arc::new(Fixed(serde_json::json!("dune"))) as Resolver,
            )]
            .into_iter()
            .collect(),
        });
        assert_eq!(rejections.len(), 2);

        let composed = builder.compile(&SchemaBuilderConfig::default()).unwrap();
        assert!(!composed.has_object_type("Query"));
        let response = composed.execute("{ search _health }").await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        assert_eq!(
            response.data.into_json().unwrap(),
            serde_json::json!({ "search": "dune", "_health": "ok" })
        );
    }
}
