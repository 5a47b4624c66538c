//! API Module
//!
//! HTTP handlers and routing for the studio REST API.
//!
//! # Endpoints
//! - `GET|PUT /students`, `DELETE /students/:id`
//! - `GET|POST /transactions` (`?year=&month=`), `PUT|DELETE /transactions/:id`
//! - `GET /finance/summary` (`?months=`), `GET|PUT /tuition` (`?year=&month=`)
//! - `GET|PUT /recitals`, `DELETE /recitals/:id`
//! - `GET|PUT /sheet-music`, `DELETE /sheet-music/:id`
//! - `GET /textbooks/:id/sheet-music`
//! - `GET /assignments`, `GET|POST /sheet-music/:id/assignments`,
//!   `DELETE /sheet-music/:id/assignments/:student_id`
//! - `GET|POST /templates`, `PUT|DELETE /templates/:id`, `POST /templates/:id/render`
//! - `GET|POST /reports` (`?studentId=`)
//! - `GET /cache/stats`, `DELETE /cache`, `DELETE /cache/:dataset`
//! - `GET /health`

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
