pub mod aggregate;
pub mod geocode;
pub mod history;
pub mod object_store;
pub mod open_meteo;
pub mod weather;
