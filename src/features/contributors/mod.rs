//! Contributors: troupes, teams, improvisators and improv groups.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | POST | `/api/contributors` | Create a contributor |
//! | GET | `/api/contributors?type=` | List contributors |
//! | GET | `/api/contributors/{identifier}` | Get a contributor |
//! | GET | `/api/contributors/{identifier}/edit` | Current edit form values |
//! | PUT | `/api/contributors/{identifier}` | Submit the edit form |
//! | DELETE | `/api/contributors/{identifier}` | Delete a contributor |
//! | GET | `/api/contributors/{identifier}/open-dates/public` | Public open dates |
//! | POST/DELETE | `/api/contributors/{identifier}/admins/{user_id}` | Admins |
//! | POST/DELETE | `/api/contributors/{identifier}/super-admins/{user_id}` | Super-admins |
//! | POST/DELETE | `/api/contributors/{identifier}/owned-open-dates/{open_date_id}` | Ownership |
//! | POST/DELETE | `/api/contributors/{identifier}/invited-open-dates/{open_date_id}` | Invitations |
//! | POST/DELETE | `/api/contributors/{identifier}/teams/{team_identifier}` | Troupe membership |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod relations;
pub mod routes;
pub mod services;

pub use services::ContributorService;
