use chrono::Utc;
use rusqlite::{named_params, Connection, OptionalExtension};

use crate::error::AppResult;
use crate::models::team::{Team, UserProfile};
use crate::utils::time::to_storage;

pub struct TeamRepository;

impl TeamRepository {
    pub fn insert_team(conn: &Connection, team: &Team) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO teams (id, name, color, created_at)
                VALUES (:id, :name, :color, :created_at)
            "#,
            named_params! {
                ":id": &team.id,
                ":name": &team.name,
                ":color": &team.color,
                ":created_at": to_storage(&Utc::now()),
            },
        )?;
        Ok(())
    }

    /// `team_name` on the profile is derived and ignored here.
    pub fn insert_user(conn: &Connection, user: &UserProfile) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO users (id, display_name, team_id, created_at)
                VALUES (:id, :display_name, :team_id, :created_at)
            "#,
            named_params! {
                ":id": &user.id,
                ":display_name": &user.display_name,
                ":team_id": &user.team_id,
                ":created_at": to_storage(&Utc::now()),
            },
        )?;
        Ok(())
    }

    pub fn find_user(conn: &Connection, id: &str) -> AppResult<Option<UserProfile>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT u.id, u.display_name, u.team_id, t.name AS team_name
                FROM users u
                LEFT JOIN teams t ON t.id = u.team_id
                WHERE u.id = :id
            "#,
        )?;
        let profile = stmt
            .query_row(named_params! {":id": id}, |row| {
                Ok(UserProfile {
                    id: row.get("id")?,
                    display_name: row.get("display_name")?,
                    team_id: row.get("team_id")?,
                    team_name: row.get("team_name")?,
                })
            })
            .optional()?;
        Ok(profile)
    }

    /// Profiles for the requested ids, in request order; unknown ids are
    /// skipped.
    pub fn list_profiles(conn: &Connection, ids: &[String]) -> AppResult<Vec<UserProfile>> {
        let mut profiles = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(profile) = Self::find_user(conn, id)? {
                profiles.push(profile);
            }
        }
        Ok(profiles)
    }

    pub fn list_teams_with_members(conn: &Connection) -> AppResult<Vec<Team>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT id, name, color
                FROM teams
                ORDER BY created_at, rowid
            "#,
        )?;
        let mut teams = stmt
            .query_map([], |row| {
                Ok(Team {
                    id: row.get("id")?,
                    name: row.get("name")?,
                    color: row.get("color")?,
                    member_ids: Vec::new(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut members_stmt = conn.prepare(
            r#"
                SELECT id
                FROM users
                WHERE team_id = :team_id
                ORDER BY rowid
            "#,
        )?;
        for team in &mut teams {
            team.member_ids = members_stmt
                .query_map(named_params! {":team_id": &team.id}, |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
        }

        Ok(teams)
    }
}
