//! End-to-end binding tests.
//!
//! Each test builds a handler with [`FieldwireBuilder`], drives it with an
//! in-memory request, and inspects the recorded response.

use fieldwire::prelude::*;
use fieldwire_test::{TestContext, TestRequest, TestRequestBuilder};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

async fn dispatch<A: Action>(handler: &ActionHandler<A>, request: TestRequestBuilder) -> TestContext {
    let mut ctx = request.build().unwrap();
    handler.call(&mut ctx).await;
    ctx
}

#[derive(Default, Bindable)]
struct Greet {
    #[bind(param = "Query,name")]
    name: String,
}

impl Action for Greet {
    async fn go(&mut self) -> Result<Reply, BindError> {
        Ok(Reply::json(json!({ "greeting": format!("hello {}", self.name) })))
    }
}

#[tokio::test]
async fn test_query_field_is_bound() {
    let handler = FieldwireBuilder::new()
        .build_action(Greet::default(), Vec::new())
        .unwrap();

    let ctx = dispatch(&handler, TestRequest::get("/greet?name=Ann")).await;

    ctx.response
        .assert_status(StatusCode::OK)
        .assert_header("content-type", "application/json");
    let body: Value = ctx.response.json().unwrap();
    assert_eq!(body, json!({ "greeting": "hello Ann" }));
    assert_eq!(ctx.reported(), ["name"]);
}

#[derive(Default, Bindable)]
struct Paged {
    #[bind(param = "Query", default = "7")]
    page: i64,
}

impl Action for Paged {
    async fn go(&mut self) -> Result<Reply, BindError> {
        Ok(Reply::json(self.page))
    }
}

#[tokio::test]
async fn test_missing_value_uses_default() {
    let handler = FieldwireBuilder::new()
        .build_action(Paged::default(), Vec::new())
        .unwrap();

    let ctx = dispatch(&handler, TestRequest::get("/items")).await;
    assert_eq!(ctx.response.json::<i64>().unwrap(), 7);
    assert_eq!(ctx.reported(), ["page"]);

    let ctx = dispatch(&handler, TestRequest::get("/items?page=0x10")).await;
    assert_eq!(ctx.response.json::<i64>().unwrap(), 16);
}

#[tokio::test]
async fn test_unparsable_value_leaves_field_unset() {
    let handler = FieldwireBuilder::new()
        .build_action(Paged::default(), Vec::new())
        .unwrap();

    let ctx = dispatch(&handler, TestRequest::get("/items?page=seven")).await;
    ctx.response.assert_status(StatusCode::OK);
    assert_eq!(ctx.response.json::<i64>().unwrap(), 0);
}

#[derive(Default, Bindable)]
struct Counted {
    #[bind(param = "Query", resolver = "NotRegistered")]
    count: u32,
}

impl Action for Counted {
    async fn go(&mut self) -> Result<Reply, BindError> {
        Ok(Reply::json(self.count))
    }
}

#[tokio::test]
async fn test_unknown_resolver_falls_back_to_conversion() {
    let handler = FieldwireBuilder::new()
        .build_action(Counted::default(), Vec::new())
        .unwrap();
    assert!(handler.meta().fields()[0].resolver().is_none());

    let ctx = dispatch(&handler, TestRequest::get("/count?count=5")).await;
    assert_eq!(ctx.response.json::<u32>().unwrap(), 5);
}

#[tokio::test]
async fn test_named_resolver_replaces_conversion() {
    #[derive(Default, Bindable)]
    struct Doubled {
        #[bind(param = "Query", resolver = "Double")]
        count: u32,
    }

    impl Action for Doubled {
        async fn go(&mut self) -> Result<Reply, BindError> {
            Ok(Reply::json(self.count))
        }
    }

    let mut builder = FieldwireBuilder::new();
    builder.register_resolver("Double", |_, meta, text| {
        let value: u32 = text
            .parse()
            .map_err(|_| BindError::resolver(meta.name(), format!("{text} is not a count")))?;
        Ok(Some(Box::new(value * 2)))
    });
    let handler = builder.build_action(Doubled::default(), Vec::new()).unwrap();

    let ctx = dispatch(&handler, TestRequest::get("/?count=21")).await;
    assert_eq!(ctx.response.json::<u32>().unwrap(), 42);

    let ctx = dispatch(&handler, TestRequest::get("/?count=lots")).await;
    assert_eq!(ctx.response.json::<String>().unwrap(), "lots is not a count");
}

#[derive(Default, Bindable)]
struct Lookup {
    #[bind(param = "Header,Query,Form,key")]
    key: String,
}

impl Action for Lookup {
    async fn go(&mut self) -> Result<Reply, BindError> {
        Ok(Reply::json(self.key.clone()))
    }
}

#[tokio::test]
async fn test_origin_precedence() {
    let handler = FieldwireBuilder::new()
        .build_action(Lookup::default(), Vec::new())
        .unwrap();

    let request = TestRequest::post("/?key=from-query")
        .header("key", "from-header")
        .form_field("key", "from-form");
    let ctx = dispatch(&handler, request).await;
    assert_eq!(ctx.response.json::<String>().unwrap(), "from-header");

    let request = TestRequest::post("/?key=from-query").form_field("key", "from-form");
    let ctx = dispatch(&handler, request).await;
    assert_eq!(ctx.response.json::<String>().unwrap(), "from-query");

    let request = TestRequest::post("/").form_field("key", "from-form");
    let ctx = dispatch(&handler, request).await;
    assert_eq!(ctx.response.json::<String>().unwrap(), "from-form");
}

#[tokio::test]
async fn test_auto_expands_to_configured_origins() {
    #[derive(Default, Bindable)]
    struct Flexible {
        #[bind(param = "Auto")]
        id: u64,
    }

    impl Action for Flexible {
        async fn go(&mut self) -> Result<Reply, BindError> {
            Ok(Reply::json(self.id))
        }
    }

    let mut builder = FieldwireBuilder::new();
    let any = builder.build_action(Flexible::default(), Vec::new()).unwrap();
    builder.define_auto(&[Src::PATH]);
    let path_only = builder.build_action(Flexible::default(), Vec::new()).unwrap();

    let request = || TestRequest::get("/users/9?id=3").path_param("id", "9");
    assert_eq!(dispatch(&any, request()).await.response.json::<u64>().unwrap(), 3);
    assert_eq!(dispatch(&path_only, request()).await.response.json::<u64>().unwrap(), 9);
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct Filters {
    tags: Vec<String>,
    limit: Option<u32>,
}

#[derive(Default, Bindable)]
struct Search {
    #[bind(param = "Body", resolver = "Json")]
    filters: Filters,
    #[bind(param = "Query", checker = "required")]
    term: String,
}

impl Action for Search {
    async fn go(&mut self) -> Result<Reply, BindError> {
        Ok(Reply::json(json!({ "term": self.term, "filters": self.filters })))
    }
}

#[tokio::test]
async fn test_json_body_is_decoded() {
    let handler = FieldwireBuilder::new()
        .build_action(Search::default(), Vec::new())
        .unwrap();
    let filters = Filters {
        tags: vec!["rust".into()],
        limit: Some(5),
    };

    let ctx = dispatch(&handler, TestRequest::post("/search?term=async").json(&filters)).await;

    let body: Value = ctx.response.json().unwrap();
    assert_eq!(body, json!({ "term": "async", "filters": { "tags": ["rust"], "limit": 5 } }));
}

#[tokio::test]
async fn test_malformed_json_leaves_field_unset() {
    let handler = FieldwireBuilder::new()
        .build_action(Search::default(), Vec::new())
        .unwrap();

    let request = TestRequest::post("/search?term=x")
        .content_type("application/json")
        .body("{not json");
    let ctx = dispatch(&handler, request).await;

    let body: Value = ctx.response.json().unwrap();
    assert_eq!(body["filters"], json!({ "tags": [], "limit": null }));
}

#[tokio::test]
async fn test_required_field_missing() {
    let handler = FieldwireBuilder::new()
        .build_action(Search::default(), Vec::new())
        .unwrap();

    let ctx = dispatch(&handler, TestRequest::post("/search")).await;

    ctx.response.assert_status(StatusCode::OK);
    assert_eq!(ctx.response.json::<String>().unwrap(), "field term is required");
}

#[tokio::test]
async fn test_custom_validator() {
    #[derive(Default, Bindable)]
    struct Transfer {
        #[bind(param = "Form", checker = "positive")]
        amount: i64,
    }

    impl Action for Transfer {
        async fn go(&mut self) -> Result<Reply, BindError> {
            Ok(Reply::json(self.amount))
        }
    }

    let mut builder = FieldwireBuilder::new();
    builder.register_validator("positive", |_, meta, value| {
        match value.and_then(|value| value.downcast_ref::<i64>()) {
            Some(amount) if *amount <= 0 => {
                Err(BindError::validation(meta.name(), "amount must be positive"))
            }
            _ => Ok(()),
        }
    });
    let handler = builder.build_action(Transfer::default(), Vec::new()).unwrap();

    let ctx = dispatch(&handler, TestRequest::post("/").form_field("amount", "-3")).await;
    assert_eq!(ctx.response.json::<String>().unwrap(), "amount must be positive");

    let ctx = dispatch(&handler, TestRequest::post("/").form_field("amount", "30")).await;
    assert_eq!(ctx.response.json::<i64>().unwrap(), 30);
}

#[derive(Default, Bindable)]
struct Address {
    #[bind(param = "Query", checker = "required")]
    city: String,
    #[bind(param = "Query")]
    zip: Option<u32>,
}

#[derive(Default, Bindable)]
struct Ship {
    #[bind(param = "Recursive")]
    to: Address,
    #[bind(param = "Ctx")]
    tenant: String,
}

impl Action for Ship {
    async fn go(&mut self) -> Result<Reply, BindError> {
        Ok(Reply::json(json!({
            "city": self.to.city,
            "zip": self.to.zip,
            "tenant": self.tenant,
        })))
    }
}

#[tokio::test]
async fn test_nested_and_context_fields() {
    let handler = FieldwireBuilder::new()
        .build_action(Ship::default(), Vec::new())
        .unwrap();
    assert!(handler.meta().fields()[0].is_recursive());

    let request = TestRequest::get("/ship?city=Oslo&zip=150").context_value("tenant", String::from("acme"));
    let ctx = dispatch(&handler, request).await;

    let body: Value = ctx.response.json().unwrap();
    assert_eq!(body, json!({ "city": "Oslo", "zip": 150, "tenant": "acme" }));
}

#[tokio::test]
async fn test_nested_validators_run() {
    let handler = FieldwireBuilder::new()
        .build_action(Ship::default(), Vec::new())
        .unwrap();

    let ctx = dispatch(&handler, TestRequest::get("/ship?zip=150")).await;
    assert_eq!(ctx.response.json::<String>().unwrap(), "field city is required");
}

#[derive(Debug, Default)]
struct Inventory {
    warehouse: &'static str,
}

#[derive(Default, Bindable)]
struct Stock {
    #[bind(autowire = "inventory")]
    inventory: Option<Arc<Inventory>>,
    #[bind(param = "Query")]
    sku: String,
}

impl Action for Stock {
    async fn go(&mut self) -> Result<Reply, BindError> {
        let warehouse = self.inventory.as_ref().map(|inventory| inventory.warehouse);
        Ok(Reply::json(json!({ "sku": self.sku, "warehouse": warehouse })))
    }
}

#[tokio::test]
async fn test_autowired_singleton_is_injected() {
    let mut builder = FieldwireBuilder::new();
    builder
        .register_singleton("inventory", Some(Arc::new(Inventory { warehouse: "north" })))
        .unwrap();
    let handler = builder.build_action(Stock::default(), Vec::new()).unwrap();

    let ctx = dispatch(&handler, TestRequest::get("/stock?sku=A1")).await;

    let body: Value = ctx.response.json().unwrap();
    assert_eq!(body, json!({ "sku": "A1", "warehouse": "north" }));
}

#[tokio::test]
async fn test_prototype_value_becomes_singleton() {
    let mut builder = FieldwireBuilder::new();
    let prototype = Stock {
        inventory: Some(Arc::new(Inventory { warehouse: "south" })),
        ..Stock::default()
    };
    let handler = builder.build_action(prototype, Vec::new()).unwrap();

    let registered: Option<Option<Arc<Inventory>>> = builder.singleton("inventory");
    assert_eq!(registered.flatten().unwrap().warehouse, "south");

    let ctx = dispatch(&handler, TestRequest::get("/stock?sku=B2")).await;
    let body: Value = ctx.response.json().unwrap();
    assert_eq!(body["warehouse"], "south");
}

#[tokio::test]
async fn test_registered_singleton_wins_over_prototype() {
    let mut builder = FieldwireBuilder::new();
    builder
        .register_singleton("inventory", Some(Arc::new(Inventory { warehouse: "east" })))
        .unwrap();
    let prototype = Stock {
        inventory: Some(Arc::new(Inventory { warehouse: "west" })),
        ..Stock::default()
    };
    let handler = builder.build_action(prototype, Vec::new()).unwrap();

    let ctx = dispatch(&handler, TestRequest::get("/stock")).await;
    let body: Value = ctx.response.json().unwrap();
    assert_eq!(body["warehouse"], "east");
}

#[tokio::test]
async fn test_typed_resolver_applies_to_declared_type() {
    #[derive(Debug, Default, Clone, PartialEq)]
    struct Cents(u64);

    #[derive(Default, Bindable)]
    struct Price {
        #[bind(param = "Query")]
        amount: Cents,
    }

    impl Action for Price {
        async fn go(&mut self) -> Result<Reply, BindError> {
            Ok(Reply::json(self.amount.0))
        }
    }

    let mut builder = FieldwireBuilder::new();
    builder.register_typed_resolver_for::<Cents, _>(|_, _, text| {
        let (whole, fraction) = text.split_once('.').unwrap_or((text, "0"));
        match (whole.parse::<u64>(), fraction.parse::<u64>()) {
            (Ok(whole), Ok(fraction)) => Ok(Some(Cents(whole * 100 + fraction))),
            _ => Ok(None),
        }
    });
    let handler = builder.build_action(Price::default(), Vec::new()).unwrap();

    let ctx = dispatch(&handler, TestRequest::get("/?amount=12.34")).await;
    assert_eq!(ctx.response.json::<u64>().unwrap(), 1234);
}

#[tokio::test]
async fn test_request_scope_is_injected() {
    #[derive(Default, Bindable)]
    struct Watch {
        scope: RequestScope,
    }

    impl Action for Watch {
        async fn go(&mut self) -> Result<Reply, BindError> {
            Ok(Reply::json(self.scope.is_cancelled()))
        }
    }

    let handler = FieldwireBuilder::new()
        .build_action(Watch::default(), Vec::new())
        .unwrap();
    let scope = RequestScope::new();
    scope.cancel();

    let ctx = dispatch(&handler, TestRequest::get("/").scope(scope)).await;
    assert!(ctx.response.json::<bool>().unwrap());
}

#[tokio::test]
async fn test_init_runs_before_go() {
    #[derive(Default, Bindable)]
    struct Normalize {
        #[bind(param = "Query")]
        email: String,
    }

    impl Action for Normalize {
        fn init(&mut self) -> Result<(), BindError> {
            if self.email.is_empty() {
                return Err(BindError::init("email missing"));
            }
            self.email = self.email.to_lowercase();
            Ok(())
        }

        async fn go(&mut self) -> Result<Reply, BindError> {
            Ok(Reply::json(self.email.clone()))
        }
    }

    let handler = FieldwireBuilder::new()
        .build_action(Normalize::default(), Vec::new())
        .unwrap();

    let ctx = dispatch(&handler, TestRequest::get("/?email=Ann@Example.COM")).await;
    assert_eq!(ctx.response.json::<String>().unwrap(), "ann@example.com");

    let ctx = dispatch(&handler, TestRequest::get("/")).await;
    assert_eq!(ctx.response.json::<String>().unwrap(), "email missing");
}
