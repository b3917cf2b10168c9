use applearn_core::AccountView;

use super::{runtime, PortalArgs};

pub fn me(portal: &PortalArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (mut page, _config) = portal.page()?;
    let rt = runtime()?;
    rt.block_on(page.bootstrap());
    print_view(&page.account_view(), json)
}

pub fn logout(portal: &PortalArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (mut page, _config) = portal.page()?;
    let rt = runtime()?;
    let outcome = rt.block_on(page.logout());
    if !outcome.acknowledged {
        eprintln!("portal did not confirm the logout");
    }
    print_view(&outcome.view, false)?;
    println!("redirect: {}", outcome.redirect);
    Ok(())
}

fn print_view(view: &AccountView, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
        return Ok(());
    }
    if view.show_logout {
        println!("{}", view.welcome);
        if !view.role.is_empty() {
            println!("Role: {}", view.role);
        }
    } else {
        println!("Not signed in");
    }
    Ok(())
}
