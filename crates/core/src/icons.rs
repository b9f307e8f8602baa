//! Technology name to icon lookup.
//!
//! Icons are identified as `set:Name` (e.g. `si:SiRedux`); the page maps
//! those to SVG glyphs. Unknown names get the placeholder glyph.

use serde::Serialize;

pub const PLACEHOLDER_GLYPH: &str = "💻";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum Icon {
    Named(&'static str),
    Placeholder,
}

impl Icon {
    /// Icon id, or the placeholder glyph.
    pub fn as_str(&self) -> &'static str {
        match self {
            Icon::Named(id) => id,
            Icon::Placeholder => PLACEHOLDER_GLYPH,
        }
    }
}

/// Searched in order; the first key that matches wins.
const ICONS: &[(&str, &str)] = &[
    ("writing", "fa:FaPencilAlt"),
    ("mentorship", "fa:FaUserGraduate"),
    ("mentoring", "fa:FaUserGraduate"),
    ("ai tools", "fa:FaRobot"),
    ("ai apis", "fa:FaRobot"),
    ("ai assistant", "fa:FaRobot"),
    ("web publishing", "fa:FaGlobe"),
    ("vercel", "si:SiVercel"),
    ("render", "si:SiRender"),
    ("netlify", "si:SiNetlify"),
    ("rtk", "si:SiRedux"),
    ("cloud apis", "si:SiGooglecloud"),
    ("google apps script", "si:SiGoogleappsscript"),
    ("google sheets", "si:SiGoogleappsscript"),
    ("mongoosejs", "si:SiMongoose"),
    ("passport.js", "si:SiPassport"),
    ("pwa", "si:SiPwa"),
    ("vps", "fa:FaServer"),
    ("ssl", "fa:FaLock"),
    ("centos", "fa:FaCentos"),
    ("ubuntu", "fa:FaUbuntu"),
    ("pm2", "si:SiPm2"),
    ("webrtc", "si:SiWebrtc"),
    ("whatsapp api", "si:SiWhatsapp"),
    ("telegram api", "si:SiTelegram"),
    ("web3.js", "si:SiWeb3Dotjs"),
    ("security", "si:SiSpringsecurity"),
    ("optimization", "fa:FaDev"),
    ("blockchain", "si:SiHiveBlockchain"),
    ("cryptocurrency", "si:SiEthereum"),
    ("c++", "fa:FaPlus"),
    ("electron.js", "si:SiElectron"),
    ("webgl", "si:SiWebgl"),
    ("ethereum", "si:SiEthereum"),
    ("matter.js", "si:SiMaterialdesign"),
    ("metamask", "si:SiEthereum"),
    ("web-design", "ri:RiPaintBrushFill"),
    ("jade", "si:SiHtml5"),
    ("wordpress", "si:SiWordpress"),
    ("livescript", "si:SiAwslambda"),
    ("3dmax", "si:SiNintendogamecube"),
    ("coreldraw", "si:SiCoreldraw"),
    ("photoshop", "si:SiAdobephotoshop"),
    ("illustrator", "si:SiAdobeillustrator"),
    ("adobe", "si:SiAdobe"),
    ("godot", "si:SiGodotengine"),
    ("react", "fa:FaReact"),
    ("node", "fa:FaNode"),
    ("node.js", "fa:FaNode"),
    ("nodejs", "fa:FaNode"),
    ("javascript", "fa:FaJs"),
    ("typescript", "si:SiTypescript"),
    ("html", "fa:FaHtml5"),
    ("html5", "fa:FaHtml5"),
    ("css", "fa:FaCss3Alt"),
    ("css3", "fa:FaCss3Alt"),
    ("sass", "fa:FaSass"),
    ("scss", "fa:FaSass"),
    ("git", "fa:FaGitAlt"),
    ("github", "fa:FaGithub"),
    ("npm", "fa:FaNpm"),
    ("yarn", "fa:FaYarn"),
    ("next", "si:SiNextdotjs"),
    ("nuxt", "si:SiNuxtdotjs"),
    ("nuxt.js", "si:SiNuxtdotjs"),
    ("nuxtjs", "si:SiNuxtdotjs"),
    ("next.js", "si:SiNextdotjs"),
    ("nextjs", "si:SiNextdotjs"),
    ("redux", "si:SiRedux"),
    ("graphql", "si:SiGraphql"),
    ("express", "si:SiExpress"),
    ("expressjs", "si:SiExpress"),
    ("express.js", "si:SiExpress"),
    ("nest", "si:SiNestjs"),
    ("nestjs", "si:SiNestjs"),
    ("vue", "fa:FaVuejs"),
    ("vue.js", "fa:FaVuejs"),
    ("vuejs", "fa:FaVuejs"),
    ("angular", "fa:FaAngular"),
    ("jquery", "si:SiJquery"),
    ("three.js", "si:SiThreedotjs"),
    ("threejs", "si:SiThreedotjs"),
    ("socket.io", "si:SiSocketdotio"),
    ("socketio", "si:SiSocketdotio"),
    ("bootstrap", "fa:FaBootstrap"),
    ("tailwind", "si:SiTailwindcss"),
    ("tailwindcss", "si:SiTailwindcss"),
    ("material-ui", "si:SiMaterialdesign"),
    ("materialui", "si:SiMaterialdesign"),
    ("material design", "si:SiMaterialdesign"),
    ("chakra", "si:SiChakraui"),
    ("chakraui", "si:SiChakraui"),
    ("styled-components", "si:SiStyledcomponents"),
    ("styledcomponents", "si:SiStyledcomponents"),
    ("python", "fa:FaPython"),
    ("java", "fa:FaJava"),
    ("php", "fa:FaPhp"),
    ("laravel", "fa:FaLaravel"),
    ("mongodb", "si:SiMongodb"),
    ("postgres", "si:SiPostgresql"),
    ("postgresql", "si:SiPostgresql"),
    ("mysql", "si:SiMysql"),
    ("redis", "si:SiRedis"),
    ("database", "fa:FaDatabase"),
    ("sql", "fa:FaDatabase"),
    ("docker", "si:SiDocker"),
    ("kubernetes", "si:SiKubernetes"),
    ("k8s", "si:SiKubernetes"),
    ("aws", "fa:FaAws"),
    ("amazon web services", "fa:FaAws"),
    ("google cloud", "si:SiGooglecloud"),
    ("gcp", "si:SiGooglecloud"),
    ("azure", "fa:FaMicrosoft"),
    ("microsoft azure", "fa:FaMicrosoft"),
    ("firebase", "si:SiFirebase"),
    ("server", "fa:FaServer"),
    ("jest", "si:SiJest"),
    ("cypress", "si:SiCypress"),
    ("webpack", "si:SiWebpack"),
    ("babel", "si:SiBabel"),
    ("eslint", "si:SiEslint"),
    ("prettier", "si:SiPrettier"),
    ("vscode", "fa:FaMicrosoft"),
    ("vs code", "fa:FaMicrosoft"),
    ("visual studio code", "fa:FaMicrosoft"),
    ("microsoft", "fa:FaMicrosoft"),
    ("figma", "fa:FaFigma"),
    ("xd", "fa:FaVectorSquare"),
    ("adobe xd", "fa:FaVectorSquare"),
    ("linux", "fa:FaLinux"),
    ("windows", "fa:FaWindows"),
    ("macos", "fa:FaApple"),
    ("android", "fa:FaAndroid"),
    ("ios", "fa:FaApple"),
];

/// First key equal to, contained in, or containing the lowercased name.
pub fn icon_for(name: &str) -> Icon {
    let wanted = name.trim().to_lowercase();
    if wanted.is_empty() {
        return Icon::Placeholder;
    }
    ICONS
        .iter()
        .find(|(key, _)| wanted == *key || wanted.contains(key) || key.contains(wanted.as_str()))
        .map_or(Icon::Placeholder, |(_, id)| Icon::Named(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_and_partial_matches() {
        assert_eq!(icon_for("React"), Icon::Named("fa:FaReact"));
        assert_eq!(icon_for(" Redux Toolkit "), Icon::Named("si:SiRedux"));
        // Substring matching in table order: "node" precedes "node.js".
        assert_eq!(icon_for("Node.js"), Icon::Named("fa:FaNode"));
        // Short names hit the first key containing them.
        assert_eq!(icon_for("ts"), Icon::Named("si:SiGoogleappsscript"));
    }

    #[test]
    fn miss_is_placeholder() {
        assert_eq!(icon_for("Fortran"), Icon::Placeholder);
        assert_eq!(icon_for("   "), Icon::Placeholder);
        assert_eq!(icon_for("Fortran").as_str(), "💻");
    }
}
