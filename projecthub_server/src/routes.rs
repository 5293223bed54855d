//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause
//! the current worker to stop processing new requests. For this reason, any long, non-cpu-bound operation (e.g. I/O,
//! database operations, uploads) must be expressed as futures or asynchronous functions.
use std::str::FromStr;

use actix_multipart::Multipart;
use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use log::*;
use projecthub_engine::{
    db_types::{
        DeliverySlot,
        FileCategory,
        NewDeliveryFile,
        NewPortfolioProject,
        NewProject,
        PaymentType,
        PortfolioProject,
        PortfolioProjectUpdate,
        ProjectStatus,
        Role,
    },
    AuthApi,
    CatalogApi,
    CatalogManagement,
    OrderTarget,
    PaymentBackend,
    PaymentFlowApi,
    ProjectApi,
    ProjectManagement,
    UserManagement,
};

use crate::{
    auth::{JwtClaims, TokenIssuer},
    data_objects::{
        BuyRequestBody,
        ConfirmPaymentRequest,
        CreateOrderRequest,
        CreateOrderResponse,
        JsonResponse,
        LoginRequest,
        LoginResponse,
        LoginUser,
        PortfolioItemForm,
        ProgressRequest,
        ProjectRequestForm,
        QuoteRequest,
        RegisterRequest,
        SearchQuery,
        StatusOverrideRequest,
    },
    errors::ServerError,
    gateway::PaymentGateway,
    helpers::string_list,
    receipt::render_receipt,
    uploads,
    uploads::{read_form, UploadPolicy},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal requires [$($roles:ty),*]) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:ty),*])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds)++ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(register => Post "/auth/register" impl UserManagement);
/// Route handler for new account registration.
///
/// Accounts start out unapproved; they can only log in once an admin approves them. Duplicate emails are a 400.
pub async fn register<A>(
    body: web::Json<RegisterRequest>,
    api: web::Data<AuthApi<A>>,
) -> Result<HttpResponse, ServerError>
where A: UserManagement
{
    trace!("💻️ Received registration request");
    let RegisterRequest { email, password, contact } = body.into_inner();
    if email.trim().is_empty() || !email.contains('@') {
        return Err(ServerError::InvalidRequest("A valid email address is required".to_string()));
    }
    if password.len() < 8 {
        return Err(ServerError::InvalidRequest("Password must be at least 8 characters long".to_string()));
    }
    let user = api.register(email.trim(), &password, contact).await?;
    debug!("💻️ Registered new account for [{}]", user.email);
    Ok(HttpResponse::Created().json(user))
}

route!(login => Post "/auth/login" impl UserManagement);
/// Route handler for the login endpoint.
///
/// If the credentials check out and the account is approved, the server issues a bearer token carrying the
/// user's id, email and roles. Unknown emails and wrong passwords both return 404 so the two cannot be told
/// apart; a valid password on an unapproved account is a 403.
pub async fn login<A>(
    body: web::Json<LoginRequest>,
    api: web::Data<AuthApi<A>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError>
where A: UserManagement
{
    trace!("💻️ Received login request");
    let LoginRequest { email, password } = body.into_inner();
    let user = api.verify_credentials(email.trim(), &password).await?;
    let token = signer.issue_token(&user)?;
    debug!("💻️ Issued access token for [{}]", user.email);
    let is_admin = user.role == Role::Admin;
    let user = LoginUser { id: user.id, email: user.email, status: user.status, is_admin };
    Ok(HttpResponse::Ok().json(LoginResponse { token, user }))
}

//----------------------------------------------   Catalog (public)  -------------------------------------------
route!(portfolio_list => Get "/portfolio" impl CatalogManagement);
/// Lists the catalog, newest first. `?search=` filters on a name or description substring, or an exact tech
/// stack entry; a blank term returns everything.
pub async fn portfolio_list<C: CatalogManagement>(
    query: web::Query<SearchQuery>,
    api: web::Data<CatalogApi<C>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET portfolio, search '{}'", query.search);
    let items = api.search(&query.search).await?;
    Ok(HttpResponse::Ok().json(items))
}

route!(portfolio_item => Get "/portfolio/{id}" impl CatalogManagement);
pub async fn portfolio_item<C: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<CatalogApi<C>>,
) -> Result<HttpResponse, ServerError> {
    let item = api.item(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(item))
}

//----------------------------------------------   Catalog (admin)  --------------------------------------------
route!(add_portfolio_item => Post "/portfolio" impl CatalogManagement where requires [Role::Admin]);
/// Adds a catalog item from a multipart form. At least one listing image is required.
pub async fn add_portfolio_item<C: CatalogManagement>(
    payload: Multipart,
    api: web::Data<CatalogApi<C>>,
    upload_dir: web::Data<UploadDir>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST new catalog item");
    let form = read_form(payload, uploads::PORTFOLIO_IMAGES, &upload_dir.0).await?;
    let details: PortfolioItemForm = parse_form_fields(&form)?;
    if form.files.is_empty() {
        return Err(ServerError::InvalidRequest("At least one listing image is required".to_string()));
    }
    let image_urls = form.files.iter().map(|f| f.url.clone()).collect();
    let item = api
        .add_item(NewPortfolioProject {
            name: details.name,
            description: details.description,
            demo_url: details.demo_url,
            price: details.price,
            features: string_list(&details.features),
            tech_stacks: string_list(&details.tech_stacks),
            image_urls,
        })
        .await?;
    Ok(HttpResponse::Created().json(item))
}

route!(update_portfolio_item => Patch "/portfolio/{id}" impl CatalogManagement where requires [Role::Admin]);
/// Updates a catalog item. Freshly uploaded images replace the stored set; otherwise the `image_urls` field is
/// re-parsed, and if that too is absent the stored set is kept.
pub async fn update_portfolio_item<C: CatalogManagement>(
    path: web::Path<i64>,
    payload: Multipart,
    api: web::Data<CatalogApi<C>>,
    upload_dir: web::Data<UploadDir>,
) -> Result<HttpResponse, ServerError> {
    let item_id = path.into_inner();
    debug!("💻️ PATCH catalog item #{item_id}");
    let form = read_form(payload, uploads::PORTFOLIO_IMAGES, &upload_dir.0).await?;
    let details: PortfolioItemForm = parse_form_fields(&form)?;
    let image_urls = if form.files.is_empty() {
        let echoed = string_list(&details.image_urls);
        (!echoed.is_empty()).then_some(echoed)
    } else {
        Some(form.files.iter().map(|f| f.url.clone()).collect())
    };
    let item = api
        .update_item(item_id, PortfolioProjectUpdate {
            name: details.name,
            description: details.description,
            demo_url: details.demo_url,
            price: details.price,
            features: string_list(&details.features),
            tech_stacks: string_list(&details.tech_stacks),
            image_urls,
        })
        .await?;
    Ok(HttpResponse::Ok().json(item))
}

route!(delete_portfolio_item => Delete "/portfolio/{id}" impl CatalogManagement where requires [Role::Admin]);
/// Deletes a catalog item. Its stored files are unlinked best-effort; a file that cannot be removed never
/// fails the request.
pub async fn delete_portfolio_item<C: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<CatalogApi<C>>,
    upload_dir: web::Data<UploadDir>,
) -> Result<HttpResponse, ServerError> {
    let item_id = path.into_inner();
    let item = api.item(item_id).await?;
    api.delete_item(item_id).await?;
    let urls = item
        .image_urls
        .iter()
        .chain(item.asset_urls.iter())
        .chain(item.setup_video_url.iter())
        .chain(item.project_code_url.iter());
    for url in urls {
        if let Some(stored) = url.strip_prefix("/uploads/") {
            if let Err(e) = tokio::fs::remove_file(format!("{}/{stored}", upload_dir.0)).await {
                debug!("💻️ Could not remove {stored}. {e}");
            }
        }
    }
    info!("💻️ Catalog item #{item_id} deleted");
    Ok(HttpResponse::Ok().json(JsonResponse::success("Item deleted")))
}

route!(portfolio_video => Post "/admin/portfolio/{id}/upload-video" impl CatalogManagement where requires [Role::Admin]);
/// Replaces the item's setup video. One video file, up to 200 MB.
pub async fn portfolio_video<C: CatalogManagement>(
    path: web::Path<i64>,
    payload: Multipart,
    api: web::Data<CatalogApi<C>>,
    upload_dir: web::Data<UploadDir>,
) -> Result<HttpResponse, ServerError> {
    let item = store_slot_upload(path.into_inner(), payload, uploads::DELIVERY_VIDEO, DeliverySlot::SetupVideo, &api, &upload_dir.0).await?;
    Ok(HttpResponse::Ok().json(item))
}

route!(portfolio_code => Post "/admin/portfolio/{id}/upload-code" impl CatalogManagement where requires [Role::Admin]);
/// Replaces the item's downloadable code archive. One zip or rar file, up to 100 MB.
pub async fn portfolio_code<C: CatalogManagement>(
    path: web::Path<i64>,
    payload: Multipart,
    api: web::Data<CatalogApi<C>>,
    upload_dir: web::Data<UploadDir>,
) -> Result<HttpResponse, ServerError> {
    let item = store_slot_upload(path.into_inner(), payload, uploads::DELIVERY_CODE, DeliverySlot::ProjectCode, &api, &upload_dir.0).await?;
    Ok(HttpResponse::Ok().json(item))
}

route!(portfolio_assets => Post "/admin/portfolio/{id}/upload-assets" impl CatalogManagement where requires [Role::Admin]);
/// Appends asset files to the item. Up to ten images or PDFs per request; earlier assets are kept.
pub async fn portfolio_assets<C: CatalogManagement>(
    path: web::Path<i64>,
    payload: Multipart,
    api: web::Data<CatalogApi<C>>,
    upload_dir: web::Data<UploadDir>,
) -> Result<HttpResponse, ServerError> {
    let item_id = path.into_inner();
    debug!("💻️ POST assets for catalog item #{item_id}");
    let form = read_form(payload, uploads::DELIVERY_ASSETS, &upload_dir.0).await?;
    if form.files.is_empty() {
        return Err(ServerError::InvalidRequest("At least one asset file is required".to_string()));
    }
    let urls = form.files.iter().map(|f| f.url.clone()).collect();
    let item = api.append_assets(item_id, urls).await?;
    Ok(HttpResponse::Ok().json(item))
}

async fn store_slot_upload<C: CatalogManagement>(
    item_id: i64,
    payload: Multipart,
    policy: UploadPolicy,
    slot: DeliverySlot,
    api: &CatalogApi<C>,
    upload_dir: &str,
) -> Result<PortfolioProject, ServerError> {
    let form = read_form(payload, policy, upload_dir).await?;
    let file = form.files.first().ok_or_else(|| ServerError::InvalidRequest("A file is required".to_string()))?;
    let item = api.set_delivery_slot(item_id, slot, &file.url).await?;
    Ok(item)
}

//----------------------------------------------   Projects  ----------------------------------------------------
route!(submit_project => Post "/projects" impl ProjectManagement);
/// Accepts a new custom project request as a multipart form, with up to five attachments.
pub async fn submit_project<B: ProjectManagement>(
    claims: JwtClaims,
    payload: Multipart,
    api: web::Data<ProjectApi<B>>,
    upload_dir: web::Data<UploadDir>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST new project request from [{}]", claims.email);
    let form = read_form(payload, uploads::PROJECT_ATTACHMENTS, &upload_dir.0).await?;
    let details: ProjectRequestForm = parse_form_fields(&form)?;
    let attachments = form.files.iter().map(|f| f.url.clone()).collect();
    let project = api
        .submit_request(NewProject {
            user_id: claims.sub,
            project_name: details.project_name,
            project_summary: details.project_summary,
            project_details: details.project_details,
            budget_estimate: details.budget_estimate,
            completion_date: details.completion_date,
            contact_name: details.contact_name,
            contact_details: details.contact_details,
            attachments,
        })
        .await?;
    Ok(HttpResponse::Created().json(project))
}

route!(my_projects => Get "/projects/my-projects" impl PaymentBackend);
/// The caller's own projects, newest first, each with its payments and delivery files.
pub async fn my_projects<B: PaymentBackend>(
    claims: JwtClaims,
    api: web::Data<ProjectApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET projects for [{}]", claims.email);
    let projects = api.detailed_projects_for_user(claims.sub).await?;
    Ok(HttpResponse::Ok().json(projects))
}

route!(my_project => Get "/projects/my-project/{id}" impl PaymentBackend);
/// Full detail for one project. Owners and admins only.
pub async fn my_project<B: PaymentBackend>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<ProjectApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let project_id = path.into_inner();
    debug!("💻️ GET project #{project_id} for [{}]", claims.email);
    let detail = api.project_detail(project_id, claims.sub, claims.is_admin()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

route!(buy_project => Post "/projects/buy" impl CatalogManagement);
/// Records a buy inquiry for a catalog item.
pub async fn buy_project<C: CatalogManagement>(
    claims: JwtClaims,
    body: web::Json<BuyRequestBody>,
    api: web::Data<CatalogApi<C>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST buy request from [{}]", claims.email);
    let request = api.submit_buy_request(claims.sub, body.portfolio_project_id).await?;
    Ok(HttpResponse::Created().json(request))
}

route!(confirm_project_payment => Post "/projects/confirm-payment/{id}" impl PaymentBackend);
/// Confirms a gateway payment for a custom project. The signature is verified and the stored order must target
/// the project in the path.
pub async fn confirm_project_payment<B: PaymentBackend>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<ConfirmPaymentRequest>,
    api: web::Data<PaymentFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let project_id = path.into_inner();
    debug!("💻️ POST payment confirmation for project #{project_id} from [{}]", claims.email);
    let ConfirmPaymentRequest { razorpay_order_id, razorpay_payment_id, razorpay_signature } = body.into_inner();
    let outcome =
        api.confirm_payment(&razorpay_order_id, &razorpay_payment_id, &razorpay_signature, Some(project_id)).await?;
    Ok(HttpResponse::Ok().json(outcome.payment))
}

route!(my_payments => Get "/projects/my-payments" impl PaymentBackend);
pub async fn my_payments<B: PaymentBackend>(
    claims: JwtClaims,
    api: web::Data<PaymentFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET payments for [{}]", claims.email);
    let payments = api.payments_for_user(claims.sub).await?;
    Ok(HttpResponse::Ok().json(payments))
}

route!(my_purchases => Get "/projects/my-purchases" impl PaymentBackend);
/// The catalog items this user has paid for.
pub async fn my_purchases<B: PaymentBackend>(
    claims: JwtClaims,
    api: web::Data<PaymentFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET purchases for [{}]", claims.email);
    let purchases = api.purchases_for_user(claims.sub).await?;
    Ok(HttpResponse::Ok().json(purchases))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(create_order => Post "/payment/create-order" impl PaymentBackend, PaymentGateway);
/// Creates a gateway order. The target comes from the request; the amount is always derived from the stored
/// quote or catalog price, never from anything the client sends.
pub async fn create_order<B, G>(
    claims: JwtClaims,
    body: web::Json<CreateOrderRequest>,
    api: web::Data<PaymentFlowApi<B>>,
    gateway: web::Data<G>,
    key_id: web::Data<GatewayKeyId>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentBackend,
    G: PaymentGateway,
{
    let CreateOrderRequest { payment_type, project_id, portfolio_project_id } = body.into_inner();
    let payment_type =
        PaymentType::from_str(&payment_type).map_err(|e| ServerError::InvalidRequest(e.to_string()))?;
    let target = match (project_id, portfolio_project_id) {
        (Some(id), None) => OrderTarget::CustomProject(id),
        (None, Some(id)) => OrderTarget::CatalogItem(id),
        _ => {
            return Err(ServerError::InvalidRequest(
                "Exactly one of project_id and portfolio_project_id must be given".to_string(),
            ))
        },
    };
    debug!("💻️ POST {payment_type} order from [{}]", claims.email);
    let prepared = api.prepare_order(claims.sub, target, payment_type).await?;
    let receipt = format!("proj_{payment_type}_{}", Utc::now().timestamp_millis());
    let minted = gateway.create_order(prepared.amount, &prepared.currency, &receipt).await?;
    let order = api.record_order(&minted.id, prepared).await?;
    Ok(HttpResponse::Ok().json(CreateOrderResponse {
        order_id: order.order_id,
        amount: order.amount.value(),
        currency: order.currency,
        key_id: key_id.0.clone(),
    }))
}

route!(verify_payment => Post "/payment/verify-payment" impl PaymentBackend);
/// Confirms a gateway payment against the stored order. Same verification routine as the project endpoint,
/// without a path target to match.
pub async fn verify_payment<B: PaymentBackend>(
    claims: JwtClaims,
    body: web::Json<ConfirmPaymentRequest>,
    api: web::Data<PaymentFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST payment verification from [{}]", claims.email);
    let ConfirmPaymentRequest { razorpay_order_id, razorpay_payment_id, razorpay_signature } = body.into_inner();
    let outcome = api.confirm_payment(&razorpay_order_id, &razorpay_payment_id, &razorpay_signature, None).await?;
    Ok(HttpResponse::Ok().json(outcome.payment))
}

route!(payment_receipt => Get "/payment/receipt/{payment_id}" impl PaymentBackend);
/// Renders a PDF receipt for one payment. Owners and admins only.
pub async fn payment_receipt<B: PaymentBackend>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<PaymentFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let payment_id = path.into_inner();
    debug!("💻️ GET receipt for payment {payment_id} by [{}]", claims.email);
    let receipt = api.receipt(&payment_id, claims.sub, claims.is_admin()).await?;
    let pdf = render_receipt(&receipt)?;
    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header(("Content-Disposition", format!("attachment; filename=\"receipt-{payment_id}.pdf\"")))
        .body(pdf))
}

//----------------------------------------------   Admin: users  -----------------------------------------------
route!(pending_users => Get "/admin/pending-users" impl UserManagement where requires [Role::Admin]);
pub async fn pending_users<A: UserManagement>(api: web::Data<AuthApi<A>>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET pending users");
    let users = api.pending_users().await?;
    Ok(HttpResponse::Ok().json(users))
}

route!(approve_user => Post "/admin/approve-user/{id}" impl UserManagement where requires [Role::Admin]);
pub async fn approve_user<A: UserManagement>(
    path: web::Path<i64>,
    api: web::Data<AuthApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    let user = api.approve_user(user_id).await?;
    info!("💻️ Account [{}] approved", user.email);
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("{} has been approved", user.email))))
}

//----------------------------------------------   Admin: projects  --------------------------------------------
route!(all_projects => Get "/admin/projects" impl ProjectManagement where requires [Role::Admin]);
pub async fn all_projects<B: ProjectManagement>(
    api: web::Data<ProjectApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET all projects");
    let projects = api.all_projects().await?;
    Ok(HttpResponse::Ok().json(projects))
}

route!(send_quote => Post "/admin/projects/{id}/quote" impl ProjectManagement where requires [Role::Admin]);
/// Sets the quote on a project, in whole rupees. Re-quoting is allowed until the first instalment is paid.
pub async fn send_quote<B: ProjectManagement>(
    path: web::Path<i64>,
    body: web::Json<QuoteRequest>,
    api: web::Data<ProjectApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let project_id = path.into_inner();
    debug!("💻️ POST quote of ₹{} for project #{project_id}", body.amount);
    let project = api.send_quote(project_id, body.amount).await?;
    Ok(HttpResponse::Ok().json(project))
}

route!(set_progress => Post "/admin/projects/{id}/progress" impl ProjectManagement where requires [Role::Admin]);
pub async fn set_progress<B: ProjectManagement>(
    path: web::Path<i64>,
    body: web::Json<ProgressRequest>,
    api: web::Data<ProjectApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let project_id = path.into_inner();
    debug!("💻️ POST progress {}% for project #{project_id}", body.percentage);
    let project = api.set_progress(project_id, body.percentage).await?;
    Ok(HttpResponse::Ok().json(project))
}

route!(override_status => Post "/admin/projects/{id}/status" impl ProjectManagement where requires [Role::Admin]);
/// Moves the project to an arbitrary known status, bypassing the usual transition rules. Unknown labels are a 400.
pub async fn override_status<B: ProjectManagement>(
    path: web::Path<i64>,
    body: web::Json<StatusOverrideRequest>,
    api: web::Data<ProjectApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let project_id = path.into_inner();
    let status =
        ProjectStatus::from_str(&body.status).map_err(|e| ServerError::InvalidRequest(e.to_string()))?;
    let project = api.override_status(project_id, status).await?;
    Ok(HttpResponse::Ok().json(project))
}

route!(project_delivery_video => Post "/admin/projects/{id}/upload-video" impl ProjectManagement where requires [Role::Admin]);
/// Attaches a delivery video to a project and marks it delivered. One video file, up to 200 MB.
pub async fn project_delivery_video<B: ProjectManagement>(
    path: web::Path<i64>,
    payload: Multipart,
    api: web::Data<ProjectApi<B>>,
    upload_dir: web::Data<UploadDir>,
) -> Result<HttpResponse, ServerError> {
    store_delivery(path.into_inner(), payload, uploads::DELIVERY_VIDEO, FileCategory::Video, &api, &upload_dir.0)
        .await
}

route!(project_delivery_code => Post "/admin/projects/{id}/upload-code" impl ProjectManagement where requires [Role::Admin]);
/// Attaches a delivery code archive to a project and marks it delivered. One zip or rar file, up to 100 MB.
pub async fn project_delivery_code<B: ProjectManagement>(
    path: web::Path<i64>,
    payload: Multipart,
    api: web::Data<ProjectApi<B>>,
    upload_dir: web::Data<UploadDir>,
) -> Result<HttpResponse, ServerError> {
    store_delivery(path.into_inner(), payload, uploads::DELIVERY_CODE, FileCategory::Code, &api, &upload_dir.0).await
}

route!(project_delivery_assets => Post "/admin/projects/{id}/upload-assets" impl ProjectManagement where requires [Role::Admin]);
/// Attaches delivery assets to a project and marks it delivered. Up to ten images or PDFs per request.
pub async fn project_delivery_assets<B: ProjectManagement>(
    path: web::Path<i64>,
    payload: Multipart,
    api: web::Data<ProjectApi<B>>,
    upload_dir: web::Data<UploadDir>,
) -> Result<HttpResponse, ServerError> {
    store_delivery(path.into_inner(), payload, uploads::DELIVERY_ASSETS, FileCategory::Asset, &api, &upload_dir.0)
        .await
}

async fn store_delivery<B: ProjectManagement>(
    project_id: i64,
    payload: Multipart,
    policy: UploadPolicy,
    category: FileCategory,
    api: &ProjectApi<B>,
    upload_dir: &str,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST {category} delivery for project #{project_id}");
    let form = read_form(payload, policy, upload_dir).await?;
    if form.files.is_empty() {
        return Err(ServerError::InvalidRequest("At least one delivery file is required".to_string()));
    }
    let files = form
        .files
        .into_iter()
        .map(|f| NewDeliveryFile { filename: f.filename, url: f.url, file_type: category })
        .collect();
    let stored = api.attach_delivery_files(project_id, files).await?;
    Ok(HttpResponse::Ok().json(stored))
}

//----------------------------------------------   Admin: listings  --------------------------------------------
route!(all_payments => Get "/admin/payments" impl PaymentBackend where requires [Role::Admin]);
pub async fn all_payments<B: PaymentBackend>(
    api: web::Data<PaymentFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET all payments");
    let payments = api.all_payments().await?;
    Ok(HttpResponse::Ok().json(payments))
}

route!(buy_requests => Get "/admin/buy-requests" impl CatalogManagement where requires [Role::Admin]);
pub async fn buy_requests<C: CatalogManagement>(
    api: web::Data<CatalogApi<C>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET buy requests");
    let requests = api.buy_requests().await?;
    Ok(HttpResponse::Ok().json(requests))
}

//----------------------------------------------   Support  ----------------------------------------------------

/// The directory uploads are stored in, registered as app data.
#[derive(Clone)]
pub struct UploadDir(pub String);

/// The gateway key id, exposed to clients so their checkout widget can reference the right account.
#[derive(Clone)]
pub struct GatewayKeyId(pub String);

/// Deserializes a struct from the text fields of a multipart form.
fn parse_form_fields<T: serde::de::DeserializeOwned>(form: &uploads::UploadedForm) -> Result<T, ServerError> {
    let map: serde_json::Map<String, serde_json::Value> =
        form.fields.iter().map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone()))).collect();
    serde_json::from_value(serde_json::Value::Object(map)).map_err(|e| {
        debug!("💻️ Could not parse form fields. {e}");
        ServerError::InvalidRequestBody(e.to_string())
    })
}
