// SPDX-FileCopyrightText: 2026 Heritage Catalog contributors
// SPDX-License-Identifier: MIT

//! Database schema definitions for the catalog.

/// Lookup tables, referenced by artifacts.
pub const LOOKUP_SCHEMA_SQL: &str = r#"
create table if not exists formats (
    id   integer primary key autoincrement not null,
    name text unique not null
);

create table if not exists locations (
    id   integer primary key autoincrement not null,
    name text unique not null
);

create table if not exists creators (
    id   integer primary key autoincrement not null,
    name text unique not null
);

create table if not exists materials (
    id          integer primary key autoincrement not null,
    name        text unique not null,
    description text
);

create table if not exists tags (
    id   integer primary key autoincrement not null,
    name text unique not null
);
"#;

/// Artifacts, their association tables and owned children.
pub const ARTIFACT_SCHEMA_SQL: &str = r#"
create table if not exists artifacts (
    id          integer primary key autoincrement not null,
    name        text not null check (length(trim(name)) > 0),
    description text,
    format_id   integer,
    location_id integer,
    foreign key (format_id) references formats(id) on delete set null,
    foreign key (location_id) references locations(id) on delete set null
);

create index if not exists IndexArtifactFormat on artifacts(format_id);
create index if not exists IndexArtifactLocation on artifacts(location_id);

create table if not exists artifact_creators (
    artifact_id integer not null,
    creator_id  integer not null,
    primary key (artifact_id, creator_id),
    foreign key (artifact_id) references artifacts(id) on delete cascade,
    foreign key (creator_id) references creators(id) on delete cascade
);

create table if not exists artifact_materials (
    artifact_id integer not null,
    material_id integer not null,
    primary key (artifact_id, material_id),
    foreign key (artifact_id) references artifacts(id) on delete cascade,
    foreign key (material_id) references materials(id) on delete cascade
);

create table if not exists artifact_tags (
    artifact_id integer not null,
    tag_id      integer not null,
    primary key (artifact_id, tag_id),
    foreign key (artifact_id) references artifacts(id) on delete cascade,
    foreign key (tag_id) references tags(id) on delete cascade
);

create index if not exists IndexArtifactCreatorsCreator on artifact_creators(creator_id);
create index if not exists IndexArtifactMaterialsMaterial on artifact_materials(material_id);
create index if not exists IndexArtifactTagsTag on artifact_tags(tag_id);

create table if not exists images (
    id          integer primary key autoincrement not null,
    url         text not null,
    artifact_id integer,
    foreign key (artifact_id) references artifacts(id) on delete cascade
);

create index if not exists IndexImagesArtifact on images(artifact_id);

create table if not exists conservation_reports (
    id                 integer primary key autoincrement not null,
    artifact_id        integer not null,
    details            text not null,
    conditions         text not null,
    preservation_needs text not null,
    date               text not null,
    foreign key (artifact_id) references artifacts(id) on delete cascade
);

create index if not exists IndexConservationReportsArtifact on conservation_reports(artifact_id);
"#;

/// Schema version, stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i32 = 1;
