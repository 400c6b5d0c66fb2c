//! # Resource Contracts
//!
//! One parameterized factory produces every per-resource contract. A
//! [`ResourceSpec`] is plain configuration: the entity field list and a
//! table of [`RouteSpec`]s. [`ResourceSpec::build`] compiles it into
//! [`ResourceSchemas`].
//!
//! ## Route Contracts
//!
//! | kind     | inbound                                           | response envelope data            |
//! |----------|---------------------------------------------------|-----------------------------------|
//! | `list`   | optional `skip`/`take`, body or coerced query      | `array<entity>`                   |
//! | `upload` | optional query `{<reference_field>: coerce >= 1}` | entity, or `{db, originalFileData}` |
//! | `get`    | path `{id: coerce >= 1}`                          | entity                            |
//! | `delete` | path `{id: coerce >= 1}`                          | entity minus `omit`               |
//! | `file`   | path `{id: coerce >= 1}`                          | none, raw transport               |
//! | `create` | body = draft                                      | entity                            |
//! | `update` | path `{id}` + body = partial draft                | entity                            |
//!
//! The draft is the entity without its server-generated fields (`id` by
//! default). The update body is the draft with every field optional.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::envelope::{envelope_schema, EnvelopeSchema};
use crate::file_data::FileDataProfile;
use crate::shape::{ObjectShape, Shape};
use crate::validate::{CompiledSchema, Contract, SchemaValidationError};

/// Name of the numeric path parameter on `/:id` routes.
pub const PATH_ID: &str = "id";

/// Key of the entity in an upload response carrying file metadata.
pub const UPLOAD_RECORD_KEY: &str = "db";

/// Key of the file metadata in an upload response.
pub const UPLOAD_FILE_DATA_KEY: &str = "originalFileData";

/// The kind of a route, unique within a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    List,
    Upload,
    Get,
    Delete,
    File,
    Create,
    Update,
}

impl RouteKind {
    /// All kinds, in display order.
    pub const ALL: [RouteKind; 7] = [
        RouteKind::List,
        RouteKind::Upload,
        RouteKind::Get,
        RouteKind::Delete,
        RouteKind::File,
        RouteKind::Create,
        RouteKind::Update,
    ];

    /// Configuration name.
    pub fn as_str(self) -> &'static str {
        match self {
            RouteKind::List => "list",
            RouteKind::Upload => "upload",
            RouteKind::Get => "get",
            RouteKind::Delete => "delete",
            RouteKind::File => "file",
            RouteKind::Create => "create",
            RouteKind::Update => "update",
        }
    }

    /// HTTP method the route is served under.
    pub fn method(self) -> &'static str {
        match self {
            RouteKind::List | RouteKind::Get | RouteKind::File => "GET",
            RouteKind::Upload | RouteKind::Create => "POST",
            RouteKind::Delete => "DELETE",
            RouteKind::Update => "PATCH",
        }
    }
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RouteKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown route kind \"{s}\""))
    }
}

/// One piece of inbound or outbound data of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutePart {
    PathParams,
    QueryParams,
    Body,
    Response,
}

impl RoutePart {
    /// All parts, in display order.
    pub const ALL: [RoutePart; 4] = [
        RoutePart::PathParams,
        RoutePart::QueryParams,
        RoutePart::Body,
        RoutePart::Response,
    ];

    /// Short name used in contract names and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            RoutePart::PathParams => "path",
            RoutePart::QueryParams => "query",
            RoutePart::Body => "body",
            RoutePart::Response => "response",
        }
    }
}

impl fmt::Display for RoutePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoutePart {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoutePart::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown route part \"{s}\" (expected path, query, body or response)"))
    }
}

/// Where a list route reads `skip` / `take` from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationSource {
    /// JSON body, plain numbers.
    #[default]
    Body,
    /// Query string, numbers coerced from text.
    Query,
}

/// What an upload route returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPayload {
    /// The stored entity.
    #[default]
    Entity,
    /// `{db: <entity>, originalFileData: <file metadata>}`.
    WithFileData,
}

/// Declaration of one route of a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum RouteSpec {
    List {
        path: String,
        #[serde(default)]
        pagination: PaginationSource,
    },
    Upload {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reference_field: Option<String>,
        #[serde(default)]
        payload: UploadPayload,
    },
    Get {
        path: String,
    },
    Delete {
        path: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        omit: Vec<String>,
    },
    File {
        path: String,
    },
    Create {
        path: String,
    },
    Update {
        path: String,
    },
}

impl RouteSpec {
    /// The route's kind.
    pub fn kind(&self) -> RouteKind {
        match self {
            RouteSpec::List { .. } => RouteKind::List,
            RouteSpec::Upload { .. } => RouteKind::Upload,
            RouteSpec::Get { .. } => RouteKind::Get,
            RouteSpec::Delete { .. } => RouteKind::Delete,
            RouteSpec::File { .. } => RouteKind::File,
            RouteSpec::Create { .. } => RouteKind::Create,
            RouteSpec::Update { .. } => RouteKind::Update,
        }
    }

    /// Path relative to the resource mount point, e.g. `/delete/:id`.
    pub fn path(&self) -> &str {
        match self {
            RouteSpec::List { path, .. }
            | RouteSpec::Upload { path, .. }
            | RouteSpec::Get { path }
            | RouteSpec::Delete { path, .. }
            | RouteSpec::File { path }
            | RouteSpec::Create { path }
            | RouteSpec::Update { path } => path,
        }
    }
}

fn default_generated() -> Vec<String> {
    vec![PATH_ID.to_string()]
}

/// Configuration of one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceSpec {
    /// Resource name, also its mount point (`/thumbnails`).
    pub name: String,
    /// Entity fields, excluding file metadata.
    pub entity: ObjectShape,
    /// Merge the deployment's file metadata fields into the entity.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub include_file_data: bool,
    /// Entity fields assigned by the server, dropped from the draft.
    #[serde(default = "default_generated")]
    pub generated: Vec<String>,
    /// Route table.
    pub routes: Vec<RouteSpec>,
}

impl ResourceSpec {
    /// Start a resource with the given entity and no routes.
    pub fn new(name: impl Into<String>, entity: ObjectShape) -> Self {
        Self {
            name: name.into(),
            entity,
            include_file_data: false,
            generated: default_generated(),
            routes: Vec::new(),
        }
    }

    /// Merge file metadata into the entity.
    pub fn with_file_data(mut self) -> Self {
        self.include_file_data = true;
        self
    }

    /// Add a route.
    pub fn route(mut self, route: RouteSpec) -> Self {
        self.routes.push(route);
        self
    }

    /// The entity shape under a file metadata profile.
    pub fn entity_shape(&self, file_data: FileDataProfile) -> ObjectShape {
        if self.include_file_data {
            self.entity.clone().merge(&file_data.shape())
        } else {
            self.entity.clone()
        }
    }

    /// Check internal consistency. Returns one message per problem.
    pub fn problems(&self, file_data: FileDataProfile) -> Vec<String> {
        let mut problems = Vec::new();
        let entity = self.entity_shape(file_data);

        if self.name.is_empty() {
            problems.push("resource name must not be empty".to_string());
        }
        for dupe in self.entity.duplicate_names() {
            problems.push(format!("{}: field \"{dupe}\" declared twice", self.name));
        }

        let mut kinds: Vec<RouteKind> = Vec::new();
        for route in &self.routes {
            let kind = route.kind();
            if kinds.contains(&kind) {
                problems.push(format!("{}: route kind \"{kind}\" declared twice", self.name));
            }
            kinds.push(kind);

            match route {
                RouteSpec::Upload {
                    reference_field: Some(field),
                    ..
                } if field.is_empty() => {
                    problems.push(format!("{}: upload reference_field must not be empty", self.name));
                }
                RouteSpec::Delete { omit, .. } => {
                    for name in omit.iter().filter(|n| !entity.contains(n)) {
                        problems.push(format!(
                            "{}: delete omits undeclared field \"{name}\"",
                            self.name
                        ));
                    }
                }
                _ => {}
            }
        }

        if kinds.contains(&RouteKind::Create) || kinds.contains(&RouteKind::Update) {
            for name in self.generated.iter().filter(|n| !entity.contains(n)) {
                problems.push(format!(
                    "{}: generated field \"{name}\" is not an entity field",
                    self.name
                ));
            }
        }

        problems
    }

    /// Compile every contract of this resource.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaValidationError::ConfigInvalid`] when
    /// [`problems`](Self::problems) is non-empty, or a build error from
    /// compilation.
    pub fn build(&self, file_data: FileDataProfile) -> Result<ResourceSchemas, SchemaValidationError> {
        let problems = self.problems(file_data);
        if !problems.is_empty() {
            return Err(SchemaValidationError::ConfigInvalid {
                reason: problems.join("; "),
            });
        }

        let entity = self.entity_shape(file_data);
        let draft = entity.clone().omit(self.generated.as_slice());
        let update = draft.clone().partial();

        let routes = self
            .routes
            .iter()
            .map(|route| self.build_route(route, &entity, &draft, &update, file_data))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ResourceSchemas {
            name: self.name.clone(),
            entity: CompiledSchema::compile(format!("{}.entity", self.name), Shape::object(entity))?,
            draft: CompiledSchema::compile(format!("{}.draft", self.name), Shape::object(draft))?,
            update: CompiledSchema::compile(format!("{}.update", self.name), Shape::object(update))?,
            routes,
        })
    }

    fn build_route(
        &self,
        route: &RouteSpec,
        entity: &ObjectShape,
        draft: &ObjectShape,
        update: &ObjectShape,
        file_data: FileDataProfile,
    ) -> Result<RouteSchemas, SchemaValidationError> {
        let kind = route.kind();
        let mut built = RouteSchemas {
            kind,
            path: route.path().to_string(),
            path_params: None,
            query_params: None,
            body: None,
            response: None,
        };

        let compile = |part: RoutePart, shape: ObjectShape| {
            CompiledSchema::compile(self.contract_name(kind, part), Shape::object(shape))
        };
        let respond = |data: Shape| envelope_schema(self.contract_name(kind, RoutePart::Response), data);
        let id_params = || ObjectShape::new().required(PATH_ID, Shape::coerced_min(1));
        let entity_data = || Shape::object(entity.clone());

        match route {
            RouteSpec::List { pagination, .. } => {
                let number = match pagination {
                    PaginationSource::Body => Shape::number(),
                    PaginationSource::Query => Shape::coerced(),
                };
                let page = ObjectShape::new()
                    .optional("skip", number.clone())
                    .optional("take", number);
                match pagination {
                    PaginationSource::Body => built.body = Some(compile(RoutePart::Body, page)?),
                    PaginationSource::Query => {
                        built.query_params = Some(compile(RoutePart::QueryParams, page)?)
                    }
                }
                built.response = Some(respond(Shape::array(entity_data()))?);
            }
            RouteSpec::Upload {
                reference_field,
                payload,
                ..
            } => {
                if let Some(field) = reference_field {
                    let query = ObjectShape::new().required(field.as_str(), Shape::coerced_min(1));
                    built.query_params = Some(compile(RoutePart::QueryParams, query)?);
                }
                let data = match payload {
                    UploadPayload::Entity => entity_data(),
                    UploadPayload::WithFileData => Shape::object(
                        ObjectShape::new()
                            .required(UPLOAD_RECORD_KEY, entity_data())
                            .required(UPLOAD_FILE_DATA_KEY, Shape::object(file_data.shape())),
                    ),
                };
                built.response = Some(respond(data)?);
            }
            RouteSpec::Get { .. } => {
                built.path_params = Some(compile(RoutePart::PathParams, id_params())?);
                built.response = Some(respond(entity_data())?);
            }
            RouteSpec::Delete { omit, .. } => {
                built.path_params = Some(compile(RoutePart::PathParams, id_params())?);
                let data = entity.clone().omit(omit.as_slice());
                built.response = Some(respond(Shape::object(data))?);
            }
            RouteSpec::File { .. } => {
                built.path_params = Some(compile(RoutePart::PathParams, id_params())?);
            }
            RouteSpec::Create { .. } => {
                built.body = Some(compile(RoutePart::Body, draft.clone())?);
                built.response = Some(respond(entity_data())?);
            }
            RouteSpec::Update { .. } => {
                built.path_params = Some(compile(RoutePart::PathParams, id_params())?);
                built.body = Some(compile(RoutePart::Body, update.clone())?);
                built.response = Some(respond(entity_data())?);
            }
        }

        Ok(built)
    }

    fn contract_name(&self, kind: RouteKind, part: RoutePart) -> String {
        format!("{}.{kind}.{part}", self.name)
    }
}

/// Compiled contracts of one route.
#[derive(Debug)]
pub struct RouteSchemas {
    kind: RouteKind,
    path: String,
    path_params: Option<CompiledSchema>,
    query_params: Option<CompiledSchema>,
    body: Option<CompiledSchema>,
    response: Option<EnvelopeSchema>,
}

impl RouteSchemas {
    pub fn kind(&self) -> RouteKind {
        self.kind
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> &'static str {
        self.kind.method()
    }

    pub fn path_params(&self) -> Option<&CompiledSchema> {
        self.path_params.as_ref()
    }

    pub fn query_params(&self) -> Option<&CompiledSchema> {
        self.query_params.as_ref()
    }

    pub fn body(&self) -> Option<&CompiledSchema> {
        self.body.as_ref()
    }

    /// The response envelope. `None` for routes whose response is handed
    /// to the transport untouched.
    pub fn response(&self) -> Option<&EnvelopeSchema> {
        self.response.as_ref()
    }

    /// Look up a part as a [`Contract`].
    pub fn part(&self, part: RoutePart) -> Option<&dyn Contract> {
        match part {
            RoutePart::PathParams => self.path_params.as_ref().map(|c| c as &dyn Contract),
            RoutePart::QueryParams => self.query_params.as_ref().map(|c| c as &dyn Contract),
            RoutePart::Body => self.body.as_ref().map(|c| c as &dyn Contract),
            RoutePart::Response => self.response.as_ref().map(|c| c as &dyn Contract),
        }
    }

    /// Parts this route declares a contract for.
    pub fn parts(&self) -> Vec<RoutePart> {
        RoutePart::ALL
            .into_iter()
            .filter(|p| self.part(*p).is_some())
            .collect()
    }
}

/// Compiled contracts of one resource.
#[derive(Debug)]
pub struct ResourceSchemas {
    name: String,
    entity: CompiledSchema,
    draft: CompiledSchema,
    update: CompiledSchema,
    routes: Vec<RouteSchemas>,
}

impl ResourceSchemas {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The full stored record.
    pub fn entity(&self) -> &CompiledSchema {
        &self.entity
    }

    /// The record without server-generated fields.
    pub fn draft(&self) -> &CompiledSchema {
        &self.draft
    }

    /// The draft with every field optional, still closed.
    pub fn update(&self) -> &CompiledSchema {
        &self.update
    }

    pub fn routes(&self) -> &[RouteSchemas] {
        &self.routes
    }

    pub fn route(&self, kind: RouteKind) -> Option<&RouteSchemas> {
        self.routes.iter().find(|r| r.kind == kind)
    }
}
