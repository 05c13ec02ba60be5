//! SQL schema for the Flightwatch SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per successful lookup; a refresh updates rows in place by
-- fa_flight_id. Origin and destination are flattened into columns.
CREATE TABLE IF NOT EXISTS flights (
    id                           INTEGER PRIMARY KEY AUTOINCREMENT,
    recorded_at                  TEXT NOT NULL,
    ident                        TEXT NOT NULL,
    ident_icao                   TEXT,
    ident_iata                   TEXT,
    fa_flight_id                 TEXT NOT NULL,
    operator                     TEXT,
    operator_icao                TEXT,
    operator_iata                TEXT,
    flight_number                TEXT,
    registration                 TEXT,
    route_distance               INTEGER,
    aircraft_type                TEXT,
    origin_name                  TEXT,
    origin_city                  TEXT,
    origin_code_iata             TEXT,
    origin_code_icao             TEXT,
    origin_timezone              TEXT,
    origin_info_url              TEXT,
    destination_name             TEXT,
    destination_city             TEXT,
    destination_code_iata        TEXT,
    destination_code_icao        TEXT,
    destination_timezone         TEXT,
    destination_info_url         TEXT,
    status                       TEXT,
    progress_percent             INTEGER,
    departure_delay              INTEGER,
    arrival_delay                INTEGER,
    diverted                     INTEGER NOT NULL DEFAULT 0,
    cancelled                    INTEGER NOT NULL DEFAULT 0,
    scheduled_out                TEXT,
    estimated_out                TEXT,
    actual_out                   TEXT,
    scheduled_off                TEXT,
    estimated_off                TEXT,
    actual_off                   TEXT,
    scheduled_on                 TEXT,
    estimated_on                 TEXT,
    actual_on                    TEXT,
    scheduled_in                 TEXT,
    estimated_in                 TEXT,
    actual_in                    TEXT,
    user_id                      TEXT NOT NULL,
    weather_forecast_id          INTEGER,
    weather_forecast_fetched     INTEGER NOT NULL DEFAULT 0,
    weather_forecast_status_code INTEGER,
    weather_forecast_error       TEXT
);

CREATE TABLE IF NOT EXISTS forecasts (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    recorded_at         TEXT NOT NULL,
    flight_id           INTEGER NOT NULL REFERENCES flights(id),
    fa_flight_id        TEXT NOT NULL,
    destination_city    TEXT NOT NULL,
    forecast_city       TEXT NOT NULL,
    coord_lat           REAL,
    coord_lon           REAL,
    country             TEXT,
    sunrise             INTEGER,
    sunset              INTEGER,
    scheduled_departure TEXT,
    weather             TEXT,            -- raw matched forecast slot, JSON
    user_id             TEXT NOT NULL
);

-- Entries are never deleted; completion is recorded in place. A claim only
-- lives as long as the process that took it and is cleared on open.
CREATE TABLE IF NOT EXISTS schedule_lookup (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    ident              TEXT NOT NULL,
    flight_date        TEXT NOT NULL,    -- YYYY-MM-DD
    user_id            TEXT NOT NULL,
    created_at         TEXT NOT NULL,
    lookup_complete    INTEGER NOT NULL DEFAULT 0,
    lookup_status_code INTEGER,
    lookup_flight_id   INTEGER REFERENCES flights(id),
    weather_complete   INTEGER NOT NULL DEFAULT 0,
    lookup_claimed     INTEGER NOT NULL DEFAULT 0, -- held by a running batch task
    UNIQUE (ident, flight_date, user_id)
);

CREATE INDEX IF NOT EXISTS flights_fa_flight_idx    ON flights(fa_flight_id);
CREATE INDEX IF NOT EXISTS flights_user_idx         ON flights(user_id);
CREATE INDEX IF NOT EXISTS forecasts_flight_idx     ON forecasts(flight_id);
CREATE INDEX IF NOT EXISTS schedule_lookup_date_idx ON schedule_lookup(flight_date, lookup_complete);

PRAGMA user_version = 1;
";

/// Drop claims left behind by a process that stopped mid-batch.
pub const RESET_CLAIMS: &str =
  "UPDATE schedule_lookup SET lookup_claimed = 0 WHERE lookup_complete = 0 AND lookup_claimed = 1";
