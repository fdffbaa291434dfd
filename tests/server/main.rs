mod helpers;

mod ratings_api;
mod recommendations_api;
