use super::*;
use crate::schema::users;

fn check_names(email: &str, first_name: &str, last_name: &str) -> Result<()> {
    validate::email("email", email)?;
    validate::max_len("first_name", first_name, validate::NAME_MAX_LENGTH)?;
    validate::max_len("last_name", last_name, validate::NAME_MAX_LENGTH)?;
    Ok(())
}

fn check_source_lang(source_lang: Option<&str>) -> Result<()> {
    match source_lang {
        Some(lang) => validate::lang("source_lang", lang),
        None => Ok(()),
    }
}

pub fn get(conn: &PgConnection, id: i32) -> Result<User> {
    users::table
        .filter(users::id.eq(id))
        .get_result(conn)
        .map_err(not_found("user"))
}

pub fn get_by_username(conn: &PgConnection, username: &str) -> Result<User> {
    use diesel::result::Error::NotFound;

    users::table
        .filter(users::username.eq(username))
        .first(conn)
        .map_err(|e| match e {
            NotFound => Error::from(ErrorKind::NoSuchUser(username.into())),
            e => Error::with_chain(e, "Error when trying to retrieve user!"),
        })
}

pub fn get_all(conn: &PgConnection) -> Result<Vec<User>> {
    users::table
        .order(users::username.asc())
        .load(conn)
        .chain_err(|| "Can't load users")
}

pub fn add_user(conn: &PgConnection, input: &NewUserInput) -> Result<User> {
    let username = input.username.trim();
    validate::required_text("username", username, validate::USERNAME_MAX_LENGTH)?;
    if !username.chars().all(|c| c.is_alphanumeric() || "@.+-_".contains(c)) {
        return invalid("username",
                       "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.");
    }
    check_names(&input.email, &input.first_name, &input.last_name)?;
    check_source_lang(input.source_lang.as_ref().map(|l| l.as_str()))?;

    let new_user = NewUser {
        username,
        email: &input.email,
        first_name: &input.first_name,
        last_name: &input.last_name,
        source_lang: input.source_lang.as_ref().map(|l| l.as_str()),
    };

    let user: User = conn.transaction(|| {
            diesel::insert_into(users::table)
                .values(&new_user)
                .get_result(conn)
        })
        .map_err(|e| if is_unique_violation(&e) {
            Error::from(ErrorKind::InvalidInput("username".into(),
                                                "A user with that username already exists.".into()))
        } else {
            Error::with_chain(e, "Couldn't create a new user!")
        })?;

    info!("Created a new user, with username {:?}.", user.username);
    Ok(user)
}

/// The username can't be changed; an empty patch returns the user as is.
pub fn update(conn: &PgConnection, id: i32, patch: &UserPatch) -> Result<User> {
    if patch.is_empty() {
        return get(conn, id);
    }

    if let Some(ref email) = patch.email {
        validate::email("email", email)?;
    }
    if let Some(ref first_name) = patch.first_name {
        validate::max_len("first_name", first_name, validate::NAME_MAX_LENGTH)?;
    }
    if let Some(ref last_name) = patch.last_name {
        validate::max_len("last_name", last_name, validate::NAME_MAX_LENGTH)?;
    }
    if let Some(ref source_lang) = patch.source_lang {
        check_source_lang(source_lang.as_ref().map(|l| l.as_str()))?;
    }

    diesel::update(users::table.filter(users::id.eq(id)))
        .set(patch)
        .get_result(conn)
        .map_err(not_found("user"))
}

pub fn remove_by_username(conn: &PgConnection, username: &str) -> Result<User> {
    use diesel::result::Error::NotFound;

    let user: User = diesel::delete(users::table.filter(users::username.eq(username)))
        .get_result(conn)
        .map_err(|e| match e {
            NotFound => Error::from(ErrorKind::NoSuchUser(username.into())),
            e => Error::with_chain(e, "Couldn't remove the user!"),
        })?;

    info!("Removed user {:?} and everything they owned.", user.username);
    Ok(user)
}
